//! Duration resolution: probe first, then ask, then fall back to 0.

use std::path::Path;

use crate::probe::DurationProbe;
use crate::prompt::{ask_duration_ms, Prompt};

/// Where a resolved duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationSource {
    Probe,
    Prompt,
    /// Nothing produced a value; 0 was used.
    Fallback,
}

impl std::fmt::Display for DurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationSource::Probe => write!(f, "ffprobe"),
            DurationSource::Prompt => write!(f, "entered"),
            DurationSource::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Non-negative duration in milliseconds.
    pub duration_ms: i64,
    pub source: DurationSource,
}

/// Decides a clip's duration from a probe and an optional interactive prompt.
///
/// Without a prompt the resolver is non-interactive and unknown durations
/// become 0.
pub struct DurationResolver {
    probe: Box<dyn DurationProbe>,
    prompt: Option<Box<dyn Prompt>>,
}

impl DurationResolver {
    pub fn new(probe: Box<dyn DurationProbe>) -> Self {
        Self {
            probe,
            prompt: None,
        }
    }

    /// Ask through `prompt` when probing gives no result.
    pub fn with_prompt(mut self, prompt: Box<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn resolve(&mut self, path: &Path) -> Resolution {
        if let Some(ms) = self.probe.probe_ms(path).filter(|ms| *ms >= 0) {
            tracing::debug!(input = %path.display(), duration_ms = ms, "Duration from probe");
            return Resolution {
                duration_ms: ms,
                source: DurationSource::Probe,
            };
        }

        if let Some(prompt) = self.prompt.as_deref_mut() {
            if let Some(ms) = ask_duration_ms(prompt, path) {
                tracing::debug!(input = %path.display(), duration_ms = ms, "Duration entered");
                return Resolution {
                    duration_ms: ms,
                    source: DurationSource::Prompt,
                };
            }
        }

        tracing::warn!(input = %path.display(), "Duration unknown; using 0 ms");
        Resolution {
            duration_ms: 0,
            source: DurationSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::parse_duration_output;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    /// Probe returning canned ffprobe stdout, or nothing (tool not found).
    struct FakeProbe {
        output: Option<&'static str>,
        calls: Rc<RefCell<usize>>,
    }

    impl FakeProbe {
        fn boxed(output: Option<&'static str>) -> (Box<Self>, Rc<RefCell<usize>>) {
            let calls = Rc::new(RefCell::new(0));
            let probe = Box::new(Self {
                output,
                calls: Rc::clone(&calls),
            });
            (probe, calls)
        }
    }

    impl DurationProbe for FakeProbe {
        fn probe_ms(&self, _path: &Path) -> Option<i64> {
            *self.calls.borrow_mut() += 1;
            self.output.and_then(parse_duration_output)
        }
    }

    /// Prompt answering from a script and recording what it was asked.
    struct ScriptedPrompt {
        answers: VecDeque<&'static str>,
        asked: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedPrompt {
        fn boxed(answers: &[&'static str]) -> (Box<Self>, Rc<RefCell<Vec<String>>>) {
            let asked = Rc::new(RefCell::new(Vec::new()));
            let prompt = Box::new(Self {
                answers: answers.iter().copied().collect(),
                asked: Rc::clone(&asked),
            });
            (prompt, asked)
        }
    }

    impl Prompt for ScriptedPrompt {
        fn ask_line(&mut self, message: &str) -> io::Result<Option<String>> {
            self.asked.borrow_mut().push(message.to_string());
            Ok(self.answers.pop_front().map(str::to_string))
        }
    }

    #[test]
    fn test_probe_success_wins() {
        let (probe, calls) = FakeProbe::boxed(Some("12.345\n"));
        let (prompt, asked) = ScriptedPrompt::boxed(&["999"]);
        let mut resolver = DurationResolver::new(probe).with_prompt(prompt);

        let r = resolver.resolve(Path::new("track.wav"));
        assert_eq!(r.duration_ms, 12_345);
        assert_eq!(r.source, DurationSource::Probe);
        assert_eq!(*calls.borrow(), 1);
        assert!(asked.borrow().is_empty());
    }

    #[test]
    fn test_not_found_non_interactive_is_zero() {
        let (probe, _) = FakeProbe::boxed(None);
        let mut resolver = DurationResolver::new(probe);
        assert!(!resolver.is_interactive());

        let r = resolver.resolve(Path::new("track.wav"));
        assert_eq!(r.duration_ms, 0);
        assert_eq!(r.source, DurationSource::Fallback);
    }

    #[test]
    fn test_parse_failure_non_interactive_is_zero() {
        let (probe, _) = FakeProbe::boxed(Some("N/A"));
        let mut resolver = DurationResolver::new(probe);
        assert_eq!(resolver.resolve(Path::new("track.wav")).duration_ms, 0);
    }

    #[test]
    fn test_not_found_interactive_asks() {
        let (probe, _) = FakeProbe::boxed(None);
        let (prompt, asked) = ScriptedPrompt::boxed(&["5000"]);
        let mut resolver = DurationResolver::new(probe).with_prompt(prompt);

        let r = resolver.resolve(Path::new("track.wav"));
        assert_eq!(r.duration_ms, 5000);
        assert_eq!(r.source, DurationSource::Prompt);
        assert_eq!(asked.borrow().len(), 1);
        assert!(asked.borrow()[0].contains("track.wav"));
    }

    #[test]
    fn test_parse_failure_interactive_reasks_until_valid() {
        let (probe, _) = FakeProbe::boxed(Some("garbage"));
        let (prompt, asked) = ScriptedPrompt::boxed(&["five", "-20", "1.5", "750"]);
        let mut resolver = DurationResolver::new(probe).with_prompt(prompt);

        assert_eq!(resolver.resolve(Path::new("a.ogg")).duration_ms, 750);
        assert_eq!(asked.borrow().len(), 4);
    }

    #[test]
    fn test_prompt_exhausted_falls_back() {
        let (probe, _) = FakeProbe::boxed(None);
        let (prompt, _) = ScriptedPrompt::boxed(&["x"]);
        let mut resolver = DurationResolver::new(probe).with_prompt(prompt);

        let r = resolver.resolve(Path::new("a.ogg"));
        assert_eq!(r.duration_ms, 0);
        assert_eq!(r.source, DurationSource::Fallback);
    }

    #[test]
    fn test_each_file_probed_independently() {
        let (probe, calls) = FakeProbe::boxed(Some("1.5"));
        let mut resolver = DurationResolver::new(probe);
        for name in ["a.wav", "b.wav", "c.wav"] {
            assert_eq!(resolver.resolve(Path::new(name)).duration_ms, 1500);
        }
        assert_eq!(*calls.borrow(), 3);
    }
}
