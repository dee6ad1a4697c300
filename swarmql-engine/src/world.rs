use std::collections::HashSet;

/// Key of a payload, packed from its table id and record id.
pub type PayloadKey = u64;

/// Packs a `(table_id, id)` pair into one 64-bit key.
pub fn payload_key(table_id: u32, id: u32) -> PayloadKey {
    (u64::from(table_id) << 32) | u64::from(id)
}

/// One record instance belonging to a table.
///
/// Payloads are immutable once created. A delta payload shadows the base
/// payload sharing its key; a tombstoned key is invisible to every query.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payload {
    /// Index into the world's table directory.
    pub table_id: u32,
    /// Record id, unique within the table.
    pub id: u32,
    /// Whether the record occupies a world position.
    pub placed: bool,
    /// World x coordinate; meaningful only when `placed`.
    pub x: i32,
    /// World y coordinate; meaningful only when `placed`.
    pub y: i32,
    /// Delta payloads overlay the base snapshot.
    pub is_delta: bool,
    /// The record's field bag, in insertion order.
    pub fields: Vec<PayloadField>,
}

impl Payload {
    /// Creates an unplaced base payload from `(name, value)` pairs.
    pub fn new(table_id: u32, id: u32, fields: &[(&str, &str)]) -> Self {
        Self {
            table_id,
            id,
            placed: false,
            x: 0,
            y: 0,
            is_delta: false,
            fields: fields
                .iter()
                .map(|(name, value)| PayloadField {
                    name: (*name).into(),
                    value: (*value).into(),
                })
                .collect(),
        }
    }

    /// Places the payload at a world position.
    pub fn placed_at(mut self, x: i32, y: i32) -> Self {
        self.placed = true;
        self.x = x;
        self.y = y;
        self
    }

    /// Marks the payload as a delta over the base snapshot.
    pub fn delta(mut self) -> Self {
        self.is_delta = true;
        self
    }

    /// The payload's packed key.
    pub fn key(&self) -> PayloadKey {
        payload_key(self.table_id, self.id)
    }
}

/// One named field of a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PayloadField {
    /// Field name; matched case-insensitively by queries.
    pub name: String,
    /// Field value; all values are strings.
    pub value: String,
}

/// Circular inclusion filter applied to base rows during a focused scan.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Focus {
    /// Center x.
    pub x: i32,
    /// Center y.
    pub y: i32,
    /// Inclusive radius.
    pub radius: i32,
}

impl Focus {
    /// True when the payload is placed inside the focus disc.
    pub fn contains(&self, payload: &Payload) -> bool {
        if !payload.placed {
            return false;
        }
        let dx = i64::from(payload.x) - i64::from(self.x);
        let dy = i64::from(payload.y) - i64::from(self.y);
        let radius = i64::from(self.radius);
        dx * dx + dy * dy <= radius * radius
    }
}

/// The store contract the engine executes against.
///
/// SELECTs only read; `SET LIMIT` writes the session default through
/// [`World::set_default_limit`], and INSERT/UPDATE/DELETE are delegated to
/// the appliers. The appliers default to an error so a read-only host works
/// out of the box; a host that owns real DML overrides them.
pub trait World {
    /// The table directory; `table_id` indexes into it.
    fn table_names(&self) -> &[String];

    /// Case-sensitive lookup of a table id by name.
    fn find_table(&self, name: &str) -> Option<u32>;

    /// Every payload in the store, in insertion order.
    fn payloads(&self) -> &[Payload];

    /// True when the key is hidden from all queries.
    fn is_tombstoned(&self, key: PayloadKey) -> bool;

    /// True when a delta payload shadows the base with this key.
    fn has_delta(&self, key: PayloadKey) -> bool;

    /// Session row cap applied when a query has no `LIMIT`; `-1` means
    /// unbounded.
    fn default_limit(&self) -> i64;

    /// Updates the session row cap.
    fn set_default_limit(&mut self, limit: i64);

    /// Applies an INSERT statement and returns the affected row count.
    fn apply_insert_sql(&mut self, _sql: &str) -> Result<usize, String> {
        Err("INSERT: nicht implementiert.".into())
    }

    /// Applies an UPDATE statement and returns the affected row count.
    fn apply_update_sql(&mut self, _sql: &str) -> Result<usize, String> {
        Err("UPDATE: nicht implementiert.".into())
    }

    /// Applies a DELETE statement and returns the affected row count.
    fn apply_delete_sql(&mut self, _sql: &str) -> Result<usize, String> {
        Err("DELETE: nicht implementiert.".into())
    }
}

/// Reference in-memory store backed by plain vectors and hash sets.
#[derive(Clone, Debug)]
pub struct MemoryWorld {
    tables: Vec<String>,
    payloads: Vec<Payload>,
    tombstones: HashSet<PayloadKey>,
    delta_keys: HashSet<PayloadKey>,
    default_limit: i64,
}

impl MemoryWorld {
    /// Creates an empty world with an unbounded session limit.
    pub fn new() -> Self {
        Self {
            tables: vec![],
            payloads: vec![],
            tombstones: HashSet::new(),
            delta_keys: HashSet::new(),
            default_limit: -1,
        }
    }

    /// Registers a table and returns its id.
    pub fn add_table(&mut self, name: impl Into<String>) -> u32 {
        self.tables.push(name.into());
        (self.tables.len() - 1) as u32
    }

    /// Adds a payload; delta payloads also enter the delta index.
    pub fn insert(&mut self, payload: Payload) {
        if payload.is_delta {
            self.delta_keys.insert(payload.key());
        }
        self.payloads.push(payload);
    }

    /// Hides a key from all queries.
    pub fn tombstone(&mut self, table_id: u32, id: u32) {
        self.tombstones.insert(payload_key(table_id, id));
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl World for MemoryWorld {
    fn table_names(&self) -> &[String] {
        &self.tables
    }

    fn find_table(&self, name: &str) -> Option<u32> {
        self.tables
            .iter()
            .position(|table| table == name)
            .map(|idx| idx as u32)
    }

    fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    fn is_tombstoned(&self, key: PayloadKey) -> bool {
        self.tombstones.contains(&key)
    }

    fn has_delta(&self, key: PayloadKey) -> bool {
        self.delta_keys.contains(&key)
    }

    fn default_limit(&self) -> i64 {
        self.default_limit
    }

    fn set_default_limit(&mut self, limit: i64) {
        self.default_limit = limit;
    }
}
