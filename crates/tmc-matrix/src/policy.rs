/// What to do when two steps derive the same description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail the whole expansion (no partial plan).
    Strict,
    /// Append ` #2`, ` #3`, ... to later occurrences.
    Suffix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpansionPolicy {
    /// Emit the paired race-verifier passes for eligible runs.
    pub race_verifier: bool,
    pub on_duplicate: DuplicatePolicy,
}

impl Default for ExpansionPolicy {
    fn default() -> Self {
        Self {
            race_verifier: true,
            on_duplicate: DuplicatePolicy::Suffix,
        }
    }
}
