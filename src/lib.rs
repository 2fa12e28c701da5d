//! Pronunciation assessment for recorded English speech.
//!
//! A recording is decoded, mixed to mono and resampled to 16 kHz, then
//! analysed for intonation, vowel quality, rhythm and phoneme boundaries.
//! The results feed a non-native articulation detector and a rule-based
//! 0-100 score with textual feedback. Two recordings can also be compared
//! directly by dynamic time warping of their MFCC sequences.

pub mod audio;
pub mod config;
pub mod pronunciation;
pub mod types;
