use crate::cue::cue::{Cue, CueNumber};

/// Cues ordered by ascending number. Numbers are unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CueStore {
    cues: Vec<Cue>,
}

impl CueStore {
    pub fn new() -> Self {
        Self { cues: Vec::new() }
    }

    /// Build a store from cues that are already strictly ascending.
    pub fn from_sorted(cues: Vec<Cue>) -> Result<Self, String> {
        if let Some(pair) = cues.windows(2).find(|pair| pair[0].number >= pair[1].number) {
            return Err(format!(
                "cue {} is not followed by a higher number (found {})",
                pair[0].number, pair[1].number
            ));
        }
        Ok(Self { cues })
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }

    /// Insert a cue at its sorted position, or replace the cue with the same
    /// number in place. Returns the index the cue ended up at.
    pub fn insert_or_overwrite(&mut self, cue: Cue) -> usize {
        let (first, last) = match (self.cues.first(), self.cues.last()) {
            (Some(first), Some(last)) => (first.number, last.number),
            _ => {
                self.cues.push(cue);
                return 0;
            }
        };

        if cue.number < first {
            self.cues.insert(0, cue);
            return 0;
        }
        if cue.number > last {
            self.cues.push(cue);
            return self.cues.len() - 1;
        }

        match self.cues.binary_search_by(|existing| existing.number.cmp(&cue.number)) {
            Ok(index) => {
                log::debug!("Overwriting cue {}", cue.number);
                self.cues[index] = cue;
                index
            }
            Err(index) => {
                log::debug!(
                    "Inserting cue {} after {} and before {}",
                    cue.number,
                    self.cues[index - 1].number,
                    self.cues[index].number
                );
                self.cues.insert(index, cue);
                index
            }
        }
    }

    /// Remove the cue with this number. Returns the index it occupied.
    pub fn remove(&mut self, number: CueNumber) -> Option<usize> {
        let index = self.lookup_index(number)?;
        self.cues.remove(index);
        Some(index)
    }

    pub fn lookup_index(&self, number: CueNumber) -> Option<usize> {
        self.cues.iter().position(|cue| cue.number == number)
    }

    /// Suggest a free number for recording after the cue at `from_index`.
    ///
    /// After the last cue this is the next whole number. Between two cues it
    /// is the next whole number when the gap is over 1.0, the midpoint when
    /// the gap is over 0.2, the only free tenth when the gap is exactly 0.2,
    /// and the current number itself when no free number exists.
    pub fn suggest_next_number(&self, from_index: usize) -> Option<CueNumber> {
        if self.cues.is_empty() {
            return Some(CueNumber::ZERO);
        }
        let current = self.cues.get(from_index)?.number;
        let Some(next) = self.cues.get(from_index + 1).map(|cue| cue.number) else {
            return Some(current.next_whole());
        };

        let gap = next.tenths() - current.tenths();
        let suggestion = if gap > 10 {
            current.next_whole()
        } else if gap > 2 {
            let sum = current.tenths() + next.tenths();
            CueNumber::from_tenths(sum / 2 + sum % 2)
        } else if gap == 2 {
            CueNumber::from_tenths(current.tenths() + 1)
        } else {
            current
        };
        Some(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(tenths: u16) -> Cue {
        Cue::new(
            CueNumber::from_tenths(tenths),
            vec![tenths as u8; 2],
            1.0,
            1.0,
            format!("cue {}", tenths),
            0.05,
        )
    }

    fn numbers(store: &CueStore) -> Vec<u16> {
        store.cues().iter().map(|cue| cue.number.tenths()).collect()
    }

    fn store(tenths: &[u16]) -> CueStore {
        let mut store = CueStore::new();
        for t in tenths {
            store.insert_or_overwrite(cue(*t));
        }
        store
    }

    #[test]
    fn test_insert_positions() {
        let mut store = CueStore::new();
        assert_eq!(store.insert_or_overwrite(cue(20)), 0);
        assert_eq!(store.insert_or_overwrite(cue(10)), 0);
        assert_eq!(store.insert_or_overwrite(cue(40)), 2);
        assert_eq!(store.insert_or_overwrite(cue(25)), 2);
        assert_eq!(numbers(&store), vec![10, 20, 25, 40]);
    }

    #[test]
    fn test_overwrite_keeps_index() {
        let mut store = store(&[0, 10, 20]);
        let mut replacement = cue(10);
        replacement.description = "replaced".to_string();

        assert_eq!(store.insert_or_overwrite(replacement), 1);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).unwrap().description, "replaced");

        // Overwriting the first and last cues also stays in place.
        assert_eq!(store.insert_or_overwrite(cue(0)), 0);
        assert_eq!(store.insert_or_overwrite(cue(20)), 2);
        assert_eq!(numbers(&store), vec![0, 10, 20]);
    }

    #[test]
    fn test_numbers_stay_strictly_ascending() {
        let mut store = CueStore::new();
        let sequence = [50u16, 3, 77, 3, 12, 50, 9999, 0, 12, 31, 30, 29];
        for (step, tenths) in sequence.iter().enumerate() {
            store.insert_or_overwrite(cue(*tenths));
            if step % 4 == 3 {
                store.remove(CueNumber::from_tenths(12));
            }
            let numbers = numbers(&store);
            assert!(numbers.windows(2).all(|w| w[0] < w[1]), "{:?}", numbers);
        }
    }

    #[test]
    fn test_remove_and_lookup() {
        let mut store = store(&[0, 10, 20]);
        assert_eq!(store.lookup_index(CueNumber::from_tenths(20)), Some(2));
        assert_eq!(store.remove(CueNumber::from_tenths(10)), Some(1));
        assert_eq!(store.lookup_index(CueNumber::from_tenths(10)), None);
        assert_eq!(store.remove(CueNumber::from_tenths(10)), None);
        assert_eq!(numbers(&store), vec![0, 20]);
    }

    #[test]
    fn test_from_sorted_rejects_disorder() {
        assert!(CueStore::from_sorted(vec![cue(0), cue(10)]).is_ok());
        assert!(CueStore::from_sorted(vec![cue(10), cue(10)]).is_err());
        assert!(CueStore::from_sorted(vec![cue(10), cue(0)]).is_err());
    }

    #[test]
    fn test_suggest_next_number() {
        let store = store(&[0, 5, 10, 12, 13, 25, 100, 9995]);

        // Last cue: next whole number, capped.
        assert_eq!(store.suggest_next_number(7), Some(CueNumber::MAX));
        // 10.0 -> 999.5: gap over one.
        assert_eq!(store.suggest_next_number(6).unwrap().tenths(), 110);
        // 2.5 -> 10.0: gap over one, next whole number is 3.0.
        assert_eq!(store.suggest_next_number(5).unwrap().tenths(), 30);
        // 0.0 -> 0.5: midpoint 0.25 rounds up to 0.3.
        assert_eq!(store.suggest_next_number(0).unwrap().tenths(), 3);
        // 1.0 -> 1.2: the only free tenth.
        assert_eq!(store.suggest_next_number(2).unwrap().tenths(), 11);
        // 1.2 -> 1.3: nothing free, stay put.
        assert_eq!(store.suggest_next_number(3).unwrap().tenths(), 12);
        assert_eq!(store.suggest_next_number(8), None);
        assert_eq!(CueStore::new().suggest_next_number(0), Some(CueNumber::ZERO));
    }
}
