use std::fmt;
use std::iter::FusedIterator;

use crate::game::Play;

/// Clock reading assumed before the first play of a game.
const TIP_OFF_CLOCK: &str = "20:00";

/// One offensive possession: a maximal run of plays between
/// possession-ending events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bout<'g> {
    plays: Vec<&'g Play>,
    opens_with_fga: bool,
}

impl<'g> Bout<'g> {
    fn seeded(play: &'g Play, fga: bool) -> Self {
        Self {
            plays: vec![play],
            opens_with_fga: fga,
        }
    }

    fn push(&mut self, play: &'g Play) {
        self.plays.push(play);
    }

    pub fn plays(&self) -> &[&'g Play] {
        &self.plays
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    /// The first play of the bout was a field-goal attempt.
    pub fn opens_with_fga(&self) -> bool {
        self.opens_with_fga
    }

    /// Some play describes a foul without being a free-throw play.
    pub fn includes_common_foul(&self) -> bool {
        self.plays.iter().any(|p| {
            let d = p.description.to_lowercase();
            d.contains("foul") && !d.contains("free throw")
        })
    }
}

impl fmt::Display for Bout<'_> {
    /// Compact `period,clock,vv,hh,team,description;` form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for play in &self.plays {
            write!(f, "{play};")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayKind {
    Noise,
    Turnover,
    FieldGoal,
    Foul,
    PeriodEnd,
    Other,
}

fn classify(description: &str) -> PlayKind {
    let d = description.to_lowercase();
    if ["enters", "leaves", "timeout", "deadball"]
        .iter()
        .any(|k| d.contains(k))
    {
        PlayKind::Noise
    } else if d.contains("turnover") {
        PlayKind::Turnover
    } else if (d.contains("made") || d.contains("missed")) && !d.contains("free throw") {
        PlayKind::FieldGoal
    } else if d.contains("foul") {
        PlayKind::Foul
    } else if d.contains("end of") {
        PlayKind::PeriodEnd
    } else {
        PlayKind::Other
    }
}

/// Single-pass possession segmenter over a game's plays.
///
/// A non-empty bout still open when the plays run out is not yielded; it can
/// be recovered with [`Bouts::into_pending`].
#[derive(Debug, Clone)]
pub struct Bouts<'g> {
    plays: std::slice::Iter<'g, Play>,
    current: Bout<'g>,
    prev_clock: &'g str,
}

impl<'g> Bouts<'g> {
    pub fn new(plays: &'g [Play]) -> Self {
        Self {
            plays: plays.iter(),
            current: Bout::default(),
            prev_clock: TIP_OFF_CLOCK,
        }
    }

    /// The unflushed trailing bout, if any.
    pub fn into_pending(self) -> Option<Bout<'g>> {
        (!self.current.is_empty()).then_some(self.current)
    }

    fn close(&mut self, next: Bout<'g>) -> Option<Bout<'g>> {
        let done = std::mem::replace(&mut self.current, next);
        (!done.is_empty()).then_some(done)
    }
}

impl<'g> Iterator for Bouts<'g> {
    type Item = Bout<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(play) = self.plays.next() {
            let prev_clock = std::mem::replace(&mut self.prev_clock, play.clock.as_str());

            let closed = match classify(&play.description) {
                PlayKind::Noise => continue,
                PlayKind::Turnover => self.close(Bout::seeded(play, false)),
                PlayKind::FieldGoal => self.close(Bout::seeded(play, true)),
                PlayKind::Foul => {
                    // and-one / continuation: same clock as the shot that opened the bout
                    if self.current.opens_with_fga() && play.clock == prev_clock {
                        self.current.push(play);
                        continue;
                    }
                    self.close(Bout::seeded(play, false))
                }
                PlayKind::PeriodEnd => self.close(Bout::default()),
                PlayKind::Other => {
                    self.current.push(play);
                    continue;
                }
            };

            if closed.is_some() {
                return closed;
            }
        }
        None
    }
}

impl FusedIterator for Bouts<'_> {}
