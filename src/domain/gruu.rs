//! GRUU Registry entries (§2 item 2, §3).

/// (AOR, instance-id) → opaque token. Created lazily at first registration
/// of a new pair; never deleted by this core (§9 Design Notes).
#[derive(Debug, Clone)]
pub struct GruuEntry {
    pub aor: String,
    pub instance_id: String,
    pub token: String,
}
