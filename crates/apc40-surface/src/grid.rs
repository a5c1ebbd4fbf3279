//! Clip launch grid (8 tracks x 5 scenes)
//!
//! Cells are addressed with 1-indexed `(x, y)`: x is the track column, y the
//! scene row. Colors are the device's palette indices and are not interpreted
//! here beyond keeping them inside a MIDI data byte.

use crate::address::{grid_address, GRID_COLUMNS, GRID_ROWS};
use crate::error::SurfaceError;
use crate::message::WireMessage;
use crate::transport::MidiSink;

/// Iterate all cells in send order (column by column, top to bottom)
pub fn cells() -> impl Iterator<Item = (u8, u8)> {
    (1..=GRID_COLUMNS).flat_map(|x| (1..=GRID_ROWS).map(move |y| (x, y)))
}

/// Last color sent to each clip launch LED
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipGrid {
    colors: [[u8; GRID_ROWS as usize]; GRID_COLUMNS as usize],
}

impl ClipGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last color sent to a cell
    pub fn color(&self, x: u8, y: u8) -> Result<u8, SurfaceError> {
        grid_address(x, y)?;
        Ok(self.colors[(x - 1) as usize][(y - 1) as usize])
    }

    /// Set the LED color of a clip launch button
    ///
    /// Sends `(0x90 + x - 1, 0x35 + y - 1, color)`.
    pub fn launch_led<S: MidiSink + ?Sized>(
        &mut self,
        sink: &mut S,
        x: u8,
        y: u8,
        color: u8,
    ) -> Result<(), SurfaceError> {
        let (channel, note) = grid_address(x, y)?;
        let color = color & 0x7F;

        sink.send(WireMessage::new(channel, note, color))?;
        self.colors[(x - 1) as usize][(y - 1) as usize] = color;
        Ok(())
    }

    /// Light every cell with the color chosen by `color_fn(x, y)`
    pub fn fill<S, F>(&mut self, sink: &mut S, mut color_fn: F) -> Result<(), SurfaceError>
    where
        S: MidiSink + ?Sized,
        F: FnMut(u8, u8) -> u8,
    {
        for (x, y) in cells() {
            self.launch_led(sink, x, y, color_fn(x, y))?;
        }
        Ok(())
    }

    /// Turn every cell off (color 0)
    pub fn clear<S: MidiSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SurfaceError> {
        self.fill(sink, |_, _| 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingSink;

    #[test]
    fn test_launch_led_corners() {
        let mut grid = ClipGrid::new();
        let mut sink = RecordingSink::new();

        grid.launch_led(&mut sink, 1, 1, 5).unwrap();
        grid.launch_led(&mut sink, 8, 5, 5).unwrap();

        assert_eq!(
            sink.messages(),
            &[WireMessage::new(0x90, 0x35, 5), WireMessage::new(0x97, 0x39, 5)]
        );
        assert_eq!(grid.color(8, 5).unwrap(), 5);
    }

    #[test]
    fn test_launch_led_out_of_range_sends_nothing() {
        let mut grid = ClipGrid::new();
        let mut sink = RecordingSink::new();

        assert!(grid.launch_led(&mut sink, 0, 1, 5).unwrap_err().is_out_of_range());
        assert!(grid.launch_led(&mut sink, 9, 1, 5).unwrap_err().is_out_of_range());
        assert!(grid.launch_led(&mut sink, 3, 6, 5).unwrap_err().is_out_of_range());
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_fill_covers_every_cell_once() {
        let mut grid = ClipGrid::new();
        let mut sink = RecordingSink::new();

        grid.fill(&mut sink, |x, y| x + y).unwrap();

        assert_eq!(sink.messages().len(), 40);
        assert_eq!(sink.messages()[0], WireMessage::new(0x90, 0x35, 2));
        assert_eq!(sink.messages()[1], WireMessage::new(0x90, 0x36, 3));
        assert_eq!(grid.color(4, 3).unwrap(), 7);

        grid.clear(&mut sink).unwrap();
        assert_eq!(sink.messages().len(), 80);
        assert!(cells().all(|(x, y)| grid.color(x, y).unwrap() == 0));
    }

    #[test]
    fn test_color_is_masked_to_data_byte() {
        let mut grid = ClipGrid::new();
        let mut sink = RecordingSink::new();
        grid.launch_led(&mut sink, 2, 2, 0x85).unwrap();
        assert_eq!(sink.last(), Some(WireMessage::new(0x91, 0x36, 0x05)));
    }
}
