//! Subtitle layout and rendering.
//!
//! Layout produces a backend-neutral [`SubtitleScript`]: timed events made of
//! text runs, each carrying a [`RunStyle`] descriptor. The [`ass`] renderer
//! translates a script into Advanced SubStation Alpha markup, and
//! [`overlay`] burns it into a video.

pub mod ass;
pub mod layout;
pub mod overlay;
pub mod style;

pub use layout::{
    caption_script, pack_lines, split_words, uniform_word_timings, KaraokeLayout, ScriptEvent,
    StyledRun, SubtitleScript,
};
pub use overlay::burn_subtitles;
pub use style::{Anchor, Rgb, RunStyle, ScriptHeader};
