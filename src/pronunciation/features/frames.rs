use std::borrow::Cow;

/// Fixed-size, fixed-hop analysis windows over a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub window: usize,
    pub hop: usize,
    pub sample_rate: u32,
}

impl FrameLayout {
    pub const fn new(window: usize, hop: usize, sample_rate: u32) -> Self {
        Self {
            window,
            hop,
            sample_rate,
        }
    }

    /// Number of frames covering `len` samples.
    ///
    /// Only whole windows are produced, except that a non-empty buffer shorter
    /// than one window yields a single zero-padded frame.
    pub fn frame_count(&self, len: usize) -> usize {
        if len == 0 || self.window == 0 || self.hop == 0 {
            0
        } else if len <= self.window {
            1
        } else {
            (len - self.window) / self.hop + 1
        }
    }

    /// Start time of frame `index`, in seconds.
    pub fn frame_time(&self, index: usize) -> f64 {
        (index * self.hop) as f64 / self.sample_rate as f64
    }

    /// Centre frequency of FFT bin `bin` for this window size, in Hz.
    pub fn bin_frequency(&self, bin: f64) -> f64 {
        bin * self.sample_rate as f64 / self.window as f64
    }

    /// Frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate as f64 / self.hop as f64
    }

    pub fn frames<'a>(&self, samples: &'a [f32]) -> Frames<'a> {
        Frames {
            samples,
            layout: *self,
            index: 0,
            count: self.frame_count(samples.len()),
        }
    }
}

/// Iterator over the frames of a buffer; see [`FrameLayout::frame_count`].
pub struct Frames<'a> {
    samples: &'a [f32],
    layout: FrameLayout,
    index: usize,
    count: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = Cow<'a, [f32]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let start = self.index * self.layout.hop;
        self.index += 1;
        let end = start + self.layout.window;
        if end <= self.samples.len() {
            return Some(Cow::Borrowed(&self.samples[start..end]));
        }
        let mut padded = self.samples[start..].to_vec();
        padded.resize(self.layout.window, 0.0);
        Some(Cow::Owned(padded))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

/// Per-frame values derived from one waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSeries<T> {
    layout: FrameLayout,
    values: Vec<T>,
}

impl<T> FrameSeries<T> {
    pub fn new(layout: FrameLayout, values: Vec<T>) -> Self {
        Self { layout, values }
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// `(time_secs, value)` pairs.
    pub fn timed(&self) -> impl Iterator<Item = (f64, &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(index, value)| (self.layout.frame_time(index), value))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> FrameSeries<U> {
        FrameSeries {
            layout: self.layout,
            values: self.values.iter().map(f).collect(),
        }
    }
}

/// Root-mean-square amplitude of every frame.
pub fn rms_envelope(samples: &[f32], layout: FrameLayout) -> FrameSeries<f64> {
    let values = layout
        .frames(samples)
        .map(|frame| {
            let energy: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
            (energy / frame.len().max(1) as f64).sqrt()
        })
        .collect();
    FrameSeries::new(layout, values)
}
