// Die sizing and roll-to-chore mapping
//
// Everything here is a pure function of its arguments.

/// The dice a roll can be made with, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Die {
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl Die {
    /// All dice in ascending face count
    pub const ALL: [Die; 5] = [Die::D6, Die::D8, Die::D10, Die::D12, Die::D20];

    /// Number of faces
    pub fn sides(self) -> u32 {
        match self {
            Die::D6 => 6,
            Die::D8 => 8,
            Die::D10 => 10,
            Die::D12 => 12,
            Die::D20 => 20,
        }
    }

    /// Smallest die with at least `pending_count` faces
    ///
    /// Lists longer than twenty share the D20 and cycle through it. An empty
    /// list gets a D6 so callers describing the die never have to special-case it.
    pub fn for_count(pending_count: usize) -> Die {
        Die::ALL
            .into_iter()
            .find(|die| pending_count <= die.sides() as usize)
            .unwrap_or(Die::D20)
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "D{}", self.sides())
    }
}

/// Face count of the die used for `pending_count` chores
pub fn die_size(pending_count: usize) -> u32 {
    Die::for_count(pending_count).sides()
}

/// Map a roll to an index into the pending list
///
/// `roll` is 1-based and `pending_count` must be non-zero. Rolls above the
/// pending count wrap around (cycling).
pub fn select_index(roll: u32, pending_count: usize) -> usize {
    debug_assert!(pending_count > 0, "select_index called with no pending chores");
    debug_assert!(roll >= 1, "rolls are 1-based");
    (roll.saturating_sub(1) as usize) % pending_count.max(1)
}

/// Human readable description of the upcoming roll, empty when nothing is pending
pub fn describe_roll(pending_count: usize) -> String {
    if pending_count == 0 {
        return String::new();
    }
    format!(
        "Rolling {} for {} chore{}",
        Die::for_count(pending_count),
        pending_count,
        if pending_count == 1 { "" } else { "s" }
    )
}

/// Label for the roll trigger
pub fn roll_label(pending_count: usize) -> String {
    if pending_count == 0 {
        "Add chores to roll!".to_string()
    } else {
        format!("Roll the Dice! ({} chores)", pending_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_die_size_table() {
        for n in 0..=6 {
            assert_eq!(die_size(n), 6, "n = {}", n);
        }
        for n in 7..=8 {
            assert_eq!(die_size(n), 8, "n = {}", n);
        }
        for n in 9..=10 {
            assert_eq!(die_size(n), 10, "n = {}", n);
        }
        for n in 11..=12 {
            assert_eq!(die_size(n), 12, "n = {}", n);
        }
        for n in 13..=20 {
            assert_eq!(die_size(n), 20, "n = {}", n);
        }
        assert_eq!(die_size(21), 20);
        assert_eq!(die_size(1000), 20);
    }

    #[test]
    fn test_die_size_monotonic() {
        let mut previous = die_size(0);
        for n in 1..=100 {
            let current = die_size(n);
            assert!(current >= previous, "die_size({}) = {} < {}", n, current, previous);
            previous = current;
        }
    }

    #[test]
    fn test_die_covers_count_up_to_twenty() {
        for n in 1..=20 {
            assert!(die_size(n) as usize >= n);
        }
    }

    #[test]
    fn test_select_index_in_range() {
        for n in 1..=50 {
            for roll in 1..=die_size(n) {
                let index = select_index(roll, n);
                assert!(index < n, "select_index({}, {}) = {}", roll, n, index);
            }
        }
    }

    #[test]
    fn test_select_index_values() {
        for n in 1..=30 {
            assert_eq!(select_index(1, n), 0);
        }
        assert_eq!(select_index(7, 5), 1);
        assert_eq!(select_index(4, 3), 0);
        assert_eq!(select_index(3, 3), 2);
        assert_eq!(select_index(20, 25), 19);
    }

    #[test]
    fn test_select_index_cycles_above_twenty() {
        // Only the first twenty chores are reachable with a D20
        let n = 25;
        let reachable: Vec<usize> = (1..=die_size(n)).map(|roll| select_index(roll, n)).collect();
        assert_eq!(reachable, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_die_display() {
        assert_eq!(Die::D6.to_string(), "D6");
        assert_eq!(Die::D20.to_string(), "D20");
        assert_eq!(Die::for_count(9), Die::D10);
    }

    #[test]
    fn test_describe_roll() {
        assert_eq!(describe_roll(0), "");
        assert_eq!(describe_roll(1), "Rolling D6 for 1 chore");
        assert_eq!(describe_roll(7), "Rolling D8 for 7 chores");
        assert_eq!(describe_roll(30), "Rolling D20 for 30 chores");
    }

    #[test]
    fn test_roll_label() {
        assert_eq!(roll_label(0), "Add chores to roll!");
        assert_eq!(roll_label(3), "Roll the Dice! (3 chores)");
    }
}
