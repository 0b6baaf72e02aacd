//! Access to per-hit amplitude waveforms after clustering.

/// Lookup of the full time-bin waveform behind a strip hit.
///
/// The key is the hit's `source_index`; clusters carry the index of their
/// peak hit so the waveform can be recovered once clustering is done.
pub trait WaveformSource {
    /// Waveform samples (one per time bin) for `source_index`.
    fn waveform(&self, source_index: usize) -> Option<&[i16]>;
}

/// Source for readouts that carry no waveforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWaveforms;

impl WaveformSource for NoWaveforms {
    #[inline]
    fn waveform(&self, _source_index: usize) -> Option<&[i16]> {
        None
    }
}

impl WaveformSource for [Vec<i16>] {
    fn waveform(&self, source_index: usize) -> Option<&[i16]> {
        self.get(source_index).map(Vec::as_slice)
    }
}

impl WaveformSource for Vec<Vec<i16>> {
    fn waveform(&self, source_index: usize) -> Option<&[i16]> {
        self.as_slice().waveform(source_index)
    }
}
