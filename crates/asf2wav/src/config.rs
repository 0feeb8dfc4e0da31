/// Decoded samples carried by one WMA2 packet.
pub const DEFAULT_SAMPLES_PER_PACKET: u32 = 2048;

/// Upper bound on descriptor and codec name bytes kept in memory (260 UTF-16 units).
pub const DEFAULT_MAX_NAME_BYTES: usize = 520;

/// Settings shared by the parser and the WAVE assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub samples_per_packet: u32,
    pub max_name_bytes: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            samples_per_packet: DEFAULT_SAMPLES_PER_PACKET,
            max_name_bytes: DEFAULT_MAX_NAME_BYTES,
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many decoded samples each `dpds` entry advances by.
    pub fn with_samples_per_packet(mut self, samples_per_packet: u32) -> Self {
        self.samples_per_packet = samples_per_packet;
        self
    }

    /// Sets the clamp applied to descriptor and codec name lengths.
    pub fn with_max_name_bytes(mut self, max_name_bytes: usize) -> Self {
        self.max_name_bytes = max_name_bytes;
        self
    }
}
