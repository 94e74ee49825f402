/// Size of the dense lookup region.
const DENSE_SIZE: u32 = 0x100;

/// An association between an inclusive code point range and a value.
#[derive(Debug, Clone)]
struct CharInterval<T> {
    start: u32,
    end: u32,
    value: T,
}

/// Maps code points to values.
///
/// Code points below `0x100` live in a dense table; higher ones in an
/// appendable list of intervals. The most recent registration wins in both
/// regions: a later interval overrides earlier ones where they overlap.
#[derive(Debug, Clone)]
pub struct CharReferenceMap<T> {
    dense: Vec<Option<T>>,
    intervals: Vec<CharInterval<T>>,
}

impl<T: Clone> CharReferenceMap<T> {
    pub fn new() -> Self {
        Self {
            dense: vec![None; DENSE_SIZE as usize],
            intervals: Vec::new(),
        }
    }

    /// Associate every code point in `start..=end` with `value`.
    pub fn add_interval(&mut self, start: char, end: char, value: T) {
        let (start, end) = (start as u32, end as u32);
        if start > end {
            return;
        }

        for code in start..=end.min(DENSE_SIZE - 1) {
            self.dense[code as usize] = Some(value.clone());
        }
        if end >= DENSE_SIZE {
            self.intervals.push(CharInterval {
                start: start.max(DENSE_SIZE),
                end,
                value,
            });
        }
    }

    /// Associate a single code point with `value`.
    pub fn add_char(&mut self, ch: char, value: T) {
        self.add_interval(ch, ch, value);
    }

    /// Associate the whole code point range with `value`.
    pub fn add_default_interval(&mut self, value: T) {
        self.add_interval('\0', char::MAX, value);
    }

    /// The value registered for `ch`, if any.
    pub fn lookup(&self, ch: char) -> Option<&T> {
        let code = ch as u32;
        if code < DENSE_SIZE {
            return self.dense[code as usize].as_ref();
        }
        self.intervals
            .iter()
            .rev()
            .find(|interval| interval.start <= code && code <= interval.end)
            .map(|interval| &interval.value)
    }

    /// Remove every association.
    pub fn clear(&mut self) {
        self.dense.iter_mut().for_each(|slot| *slot = None);
        self.intervals.clear();
    }
}

impl<T: Clone> Default for CharReferenceMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
