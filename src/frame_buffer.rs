use crate::consts::DMX_BUFFER_SIZE;

/// The slots of one dmx frame, excluding the start code.
pub type DmxFrame = [u8; DMX_BUFFER_SIZE];

/// Two frame buffers. The active one is filled by the receiver or drained by the transmitter,
/// the inactive one holds the last completed frame and is never touched until the next swap.
pub struct FrameBufferPair {
    buffers: [DmxFrame; 2],
    active: usize,
}

impl Default for FrameBufferPair {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBufferPair {
    pub const fn new() -> Self {
        Self {
            buffers: [[0; DMX_BUFFER_SIZE]; 2],
            active: 0,
        }
    }

    pub fn active(&self) -> &DmxFrame {
        &self.buffers[self.active]
    }

    pub fn active_mut(&mut self) -> &mut DmxFrame {
        &mut self.buffers[self.active]
    }

    /// The last completed frame.
    pub fn inactive(&self) -> &DmxFrame {
        &self.buffers[self.active ^ 1]
    }

    /// Publish the active buffer as the completed frame and start filling the other one.
    pub fn swap(&mut self) {
        self.active ^= 1;
    }
}
