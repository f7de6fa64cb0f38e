use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharStatus {
    Pending,
    Correct,
    Error,
    /// Matched after at least one miss on the same cell. Never counted as first-try correct.
    Corrected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterCell {
    pub ch: char,
    pub status: CharStatus,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Judgement {
    pub matched: bool,
    pub new_status: CharStatus,
}

pub fn seed_cells(text: &str) -> Vec<CharacterCell> {
    text.chars()
        .enumerate()
        .map(|(index, ch)| CharacterCell {
            ch,
            status: CharStatus::Pending,
            index,
        })
        .collect()
}

/// Exact comparison: no case folding, no accent normalization.
pub fn judge(expected: char, observed: char, prior: CharStatus) -> Judgement {
    if expected == observed {
        let new_status = match prior {
            CharStatus::Pending => CharStatus::Correct,
            CharStatus::Error => CharStatus::Corrected,
            settled => settled,
        };
        Judgement {
            matched: true,
            new_status,
        }
    } else {
        Judgement {
            matched: false,
            new_status: CharStatus::Error,
        }
    }
}

/// Judge `observed` against the cell at `position` and record the result on it.
pub fn judge_cell(
    cells: &mut [CharacterCell],
    position: usize,
    observed: char,
) -> Option<Judgement> {
    let cell = cells.get_mut(position)?;
    let judgement = judge(cell.ch, observed, cell.status);
    cell.status = judgement.new_status;
    Some(judgement)
}

/// Whether a keystroke is text input at all. Control characters never reach the judge.
pub fn is_typeable(ch: char) -> bool {
    !ch.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_cells_all_pending() {
        let cells = seed_cells("ola");
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|c| c.status == CharStatus::Pending));
        assert_eq!(cells[2].index, 2);
        assert_eq!(cells[2].ch, 'a');
    }

    #[test]
    fn test_seed_cells_counts_scalars_not_bytes() {
        let cells = seed_cells("ma\u{f1}ana");
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[2].ch, '\u{f1}');
    }

    #[test]
    fn test_pending_match_is_correct() {
        let j = judge('a', 'a', CharStatus::Pending);
        assert!(j.matched);
        assert_eq!(j.new_status, CharStatus::Correct);
    }

    #[test]
    fn test_error_then_match_is_corrected() {
        let mut cells = seed_cells("ab");
        let miss = judge_cell(&mut cells, 0, 'x').unwrap();
        assert!(!miss.matched);
        assert_eq!(cells[0].status, CharStatus::Error);

        let hit = judge_cell(&mut cells, 0, 'a').unwrap();
        assert!(hit.matched);
        assert_eq!(cells[0].status, CharStatus::Corrected);
    }

    #[test]
    fn test_case_and_accent_sensitive() {
        assert!(!judge('A', 'a', CharStatus::Pending).matched);
        assert!(!judge('\u{e9}', 'e', CharStatus::Pending).matched);
    }

    #[test]
    fn test_out_of_range_position_is_none() {
        let mut cells = seed_cells("a");
        assert!(judge_cell(&mut cells, 1, 'a').is_none());
    }

    #[test]
    fn test_control_chars_not_typeable() {
        assert!(!is_typeable('\u{8}'));
        assert!(!is_typeable('\u{1b}'));
        assert!(is_typeable(' '));
        assert!(is_typeable('\u{f1}'));
    }
}
