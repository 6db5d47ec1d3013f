use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the WordList's `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a given slot.
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Debug for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Word({:?})", self.string)
    }
}

/// The vocabulary available to the filler, deduplicated and partitioned by length so that seeding
/// a slot's domain doesn't require scanning every entry.
pub struct WordList {
    pub words: Vec<Word>,
    ids_by_length: Vec<Vec<WordId>>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .field("max_length", &self.max_length())
            .finish()
    }
}

impl WordList {
    /// Build a word list from raw entries. Entries are trimmed and upper-cased; blank entries and
    /// repeats are dropped, keeping the order in which each word first appeared.
    pub fn new<I, S>(raw_words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut words: Vec<Word> = vec![];
        let mut ids_by_length: Vec<Vec<WordId>> = vec![];

        for raw_word in raw_words {
            let string = raw_word.as_ref().trim().to_uppercase();
            if string.is_empty() || !seen.insert(string.clone()) {
                continue;
            }

            let glyphs: SmallVec<[char; MAX_SLOT_LENGTH]> = string.chars().collect();
            let length = glyphs.len();
            if ids_by_length.len() <= length {
                ids_by_length.resize_with(length + 1, Vec::new);
            }

            ids_by_length[length].push(words.len());
            words.push(Word { string, glyphs });
        }

        WordList { words, ids_by_length }
    }

    /// Parse a word list with one entry per line.
    pub fn parse(contents: &str) -> WordList {
        WordList::new(contents.lines())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.ids_by_length.len().saturating_sub(1)
    }

    /// All word ids whose length (in chars) is exactly `length`.
    pub fn ids_of_length(&self, length: usize) -> &[WordId] {
        self.ids_by_length.get(length).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn lookup(&self, string: &str) -> Option<WordId> {
        let string = string.trim().to_uppercase();
        self.words.iter().position(|word| word.string == string)
    }
}

#[cfg(test)]
mod tests {
    use crate::WordList;

    #[test]
    fn test_words_are_normalized_and_deduplicated() {
        let word_list = WordList::parse("cat\n DOG \n\nCat\nbird\n");

        let strings: Vec<&str> = word_list.words.iter().map(|word| word.string.as_str()).collect();
        assert_eq!(strings, vec!["CAT", "DOG", "BIRD"]);
        assert_eq!(word_list.max_length(), 4);
    }

    #[test]
    fn test_words_are_partitioned_by_length() {
        let word_list = WordList::new(["cat", "bird", "dog", "ox"]);

        assert_eq!(word_list.ids_of_length(3), &[0, 2]);
        assert_eq!(word_list.ids_of_length(4), &[1]);
        assert_eq!(word_list.ids_of_length(2), &[3]);
        assert!(word_list.ids_of_length(7).is_empty());
        assert!(word_list.ids_of_length(0).is_empty());
    }

    #[test]
    fn test_lengths_count_chars_not_bytes() {
        let word_list = WordList::new(["ÉTÉ"]);

        assert_eq!(word_list.ids_of_length(3), &[0]);
        assert_eq!(word_list.lookup("été"), Some(0));
    }
}
