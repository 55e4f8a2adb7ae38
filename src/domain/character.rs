/// Playable characters and their traits.
///
/// Traits are multipliers around 1.0. `battery` scales flashlight drain
/// (lower is better); `speed` scales walking and sprinting.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CharacterId {
    Abdullah,
    Hamza,
    Alayham,
    Abdulhamid,
    Abdulwahab,
    MohammedAlazwani,
    Qais,
    MohammedNabil,
    Munther,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Traits {
    pub speed: f32,
    pub stamina: f32,
    pub battery: f32,
    pub stealth: f32,
}

impl CharacterId {
    pub const ALL: [CharacterId; 9] = [
        CharacterId::Abdullah,
        CharacterId::Hamza,
        CharacterId::Alayham,
        CharacterId::Abdulhamid,
        CharacterId::Abdulwahab,
        CharacterId::MohammedAlazwani,
        CharacterId::Qais,
        CharacterId::MohammedNabil,
        CharacterId::Munther,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CharacterId::Abdullah => "Abdullah",
            CharacterId::Hamza => "Hamza",
            CharacterId::Alayham => "Alayham",
            CharacterId::Abdulhamid => "Abdulhamid",
            CharacterId::Abdulwahab => "Abdulwahab",
            CharacterId::MohammedAlazwani => "Mohammed Alazwani",
            CharacterId::Qais => "Qais",
            CharacterId::MohammedNabil => "Mohammed Nabil",
            CharacterId::Munther => "Munther",
        }
    }

    pub fn traits(self) -> Traits {
        let t = |speed: f32, stamina: f32, battery: f32, stealth: f32| Traits { speed, stamina, battery, stealth };
        match self {
            CharacterId::Abdullah => t(1.0, 1.0, 1.0, 1.0),
            CharacterId::Hamza => t(1.3, 1.2, 1.5, 1.2),
            CharacterId::Alayham => t(0.9, 0.8, 0.5, 1.0),
            CharacterId::Abdulhamid => t(1.1, 0.7, 1.0, 1.0),
            CharacterId::Abdulwahab => t(0.9, 1.0, 1.0, 0.5),
            CharacterId::MohammedAlazwani => t(1.05, 1.1, 0.9, 1.1),
            CharacterId::Qais => t(1.15, 1.3, 1.2, 1.5),
            CharacterId::MohammedNabil => t(0.85, 0.9, 0.7, 0.8),
            CharacterId::Munther => t(1.0, 1.5, 1.1, 0.9),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CharacterId::Abdullah => "Balanced: good at everything.",
            CharacterId::Hamza => "Sprinter: very fast, burns through the battery.",
            CharacterId::Alayham => "Technician: the battery lasts ages, but slow on foot.",
            CharacterId::Abdulhamid => "Adventurer: quick, tires early.",
            CharacterId::Abdulwahab => "Ghost: footsteps barely make a sound.",
            CharacterId::MohammedAlazwani => "Tactician: balanced with a slight battery edge.",
            CharacterId::Qais => "Reckless: fast and tireless, but loud.",
            CharacterId::MohammedNabil => "Careful: slow and quiet, saves the battery.",
            CharacterId::Munther => "Enduring: stamina for long runs.",
        }
    }

    /// Everyone except `chosen`, in roster order.
    pub fn others(chosen: CharacterId) -> impl Iterator<Item = CharacterId> {
        CharacterId::ALL.into_iter().filter(move |&c| c != chosen)
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        CharacterId::Abdullah
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_has_nine_distinct_names() {
        let mut names: Vec<&str> = CharacterId::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn others_excludes_the_chosen_one() {
        let others: Vec<_> = CharacterId::others(CharacterId::Qais).collect();
        assert_eq!(others.len(), 8);
        assert!(!others.contains(&CharacterId::Qais));
    }

    #[test]
    fn technician_drains_least() {
        let lowest = CharacterId::ALL
            .iter()
            .min_by(|a, b| a.traits().battery.total_cmp(&b.traits().battery))
            .copied();
        assert_eq!(lowest, Some(CharacterId::Alayham));
    }
}
