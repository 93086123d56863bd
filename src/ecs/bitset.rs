//! Fixed-universe bit sets used for component and system masks

const WORD_BITS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Words {
    /// Universes of 32 bits or fewer fit in a single word, no heap allocation.
    Inline(u32),
    Heap(Box<[u32]>),
}

/// Packed bit vector over a universe fixed at construction.
///
/// Indices at or beyond the universe size are a caller error and are only
/// checked in debug builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    words: Words,
    universe: usize,
}

impl BitSet {
    pub fn with_universe(universe: usize) -> Self {
        let words = if universe <= WORD_BITS {
            Words::Inline(0)
        } else {
            Words::Heap(vec![0; universe.div_ceil(WORD_BITS)].into_boxed_slice())
        };
        Self { words, universe }
    }

    pub fn universe(&self) -> usize {
        self.universe
    }

    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.universe, "bit {index} outside universe {}", self.universe);
        let (word, mask) = match &mut self.words {
            Words::Inline(bits) => (bits, 1u32 << index),
            Words::Heap(words) => (&mut words[index / WORD_BITS], 1u32 << (index % WORD_BITS)),
        };
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.universe, "bit {index} outside universe {}", self.universe);
        match &self.words {
            Words::Inline(bits) => bits & (1u32 << index) != 0,
            Words::Heap(words) => words[index / WORD_BITS] & (1u32 << (index % WORD_BITS)) != 0,
        }
    }

    /// Clear every bit.
    pub fn reset(&mut self) {
        match &mut self.words {
            Words::Inline(bits) => *bits = 0,
            Words::Heap(words) => words.iter_mut().for_each(|word| *word = 0),
        }
    }

    /// True when every bit set in `other` is also set in `self`.
    ///
    /// Sets with different word counts never contain one another.
    pub fn contains(&self, other: &BitSet) -> bool {
        match (&self.words, &other.words) {
            (Words::Inline(bits), Words::Inline(other)) => bits & other == *other,
            (Words::Heap(words), Words::Heap(others)) => {
                words.len() == others.len()
                    && words
                        .iter()
                        .zip(others.iter())
                        .all(|(word, other)| word & other == *other)
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.words {
            Words::Inline(bits) => *bits == 0,
            Words::Heap(words) => words.iter().all(|word| *word == 0),
        }
    }

    /// Iterate the indices of set bits in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        let words: &[u32] = match &self.words {
            Words::Inline(bits) => std::slice::from_ref(bits),
            Words::Heap(words) => words,
        };
        words.iter().enumerate().flat_map(|(offset, word)| {
            (0..WORD_BITS)
                .filter(move |&bit| word & (1u32 << bit) != 0)
                .map(move |bit| offset * WORD_BITS + bit)
        })
    }
}
