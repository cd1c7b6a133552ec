//! Symmetric serialization channel used for save/load and network sync
//!
//! Entities describe their state once, as a sequence of named values. The
//! context decides whether each call stores the value or overwrites it.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::foundation::math::Vec3;

/// Which way values flow through a [`SyncContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncDirection {
    /// Values are loaded into the entity
    Read,
    /// Values are stored from the entity
    Write,
}

/// Opaque channel the entity reads from or writes to
///
/// The same sequence of calls must be issued regardless of direction.
pub trait SyncContext {
    /// Current direction
    fn direction(&self) -> SyncDirection;

    /// Open a named group of values
    fn begin_group(&mut self, name: &str) -> BridgeResult<()>;

    /// Close the innermost group
    fn end_group(&mut self) -> BridgeResult<()>;

    /// Exchange a float
    fn value_f32(&mut self, name: &str, value: &mut f32) -> BridgeResult<()>;

    /// Exchange an integer
    fn value_i32(&mut self, name: &str, value: &mut i32) -> BridgeResult<()>;

    /// Exchange a flag
    fn value_bool(&mut self, name: &str, value: &mut bool) -> BridgeResult<()>;

    /// Exchange a vector
    fn value_vec3(&mut self, name: &str, value: &mut Vec3) -> BridgeResult<()>;

    /// Exchange a string
    fn value_string(&mut self, name: &str, value: &mut String) -> BridgeResult<()>;

    /// Whether values are being loaded
    fn is_reading(&self) -> bool {
        self.direction() == SyncDirection::Read
    }
}

/// A single stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncValue {
    /// Float
    F32(f32),
    /// Integer
    I32(i32),
    /// Flag
    Bool(bool),
    /// Vector
    Vec3(Vec3),
    /// String
    String(String),
}

impl SyncValue {
    const fn kind(&self) -> &'static str {
        match self {
            Self::F32(_) => "f32",
            Self::I32(_) => "i32",
            Self::Bool(_) => "bool",
            Self::Vec3(_) => "vec3",
            Self::String(_) => "string",
        }
    }
}

/// One entry of a recorded sync stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncRecord {
    /// Group opened
    BeginGroup(String),
    /// Group closed
    EndGroup,
    /// Named value
    Value {
        /// Value name
        name: String,
        /// Stored value
        value: SyncValue,
    },
}

/// In-memory [`SyncContext`]
///
/// Write into a fresh writer, then turn it into a reader to load the same
/// values back. Reading checks that names, kinds and grouping line up.
#[derive(Debug, Clone)]
pub struct MemorySync {
    direction: SyncDirection,
    records: Vec<SyncRecord>,
    cursor: usize,
    open_groups: Vec<String>,
}

impl MemorySync {
    /// Empty context in write direction
    pub const fn writer() -> Self {
        Self {
            direction: SyncDirection::Write,
            records: Vec::new(),
            cursor: 0,
            open_groups: Vec::new(),
        }
    }

    /// Context in read direction over `records`
    pub const fn reader(records: Vec<SyncRecord>) -> Self {
        Self {
            direction: SyncDirection::Read,
            records,
            cursor: 0,
            open_groups: Vec::new(),
        }
    }

    /// Turn a finished writer into a reader over the same records
    pub fn into_reader(self) -> Self {
        Self::reader(self.records)
    }

    /// Recorded stream
    pub fn records(&self) -> &[SyncRecord] {
        &self.records
    }

    /// Whether every record has been consumed (read direction)
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.records.len()
    }

    /// Serialize the recorded stream as RON
    pub fn snapshot(&self) -> BridgeResult<String> {
        ron::to_string(&self.records).map_err(|e| BridgeError::Native(e.to_string()))
    }

    /// Reader over a stream produced by [`MemorySync::snapshot`]
    pub fn from_snapshot(text: &str) -> BridgeResult<Self> {
        let records = ron::from_str(text).map_err(|e| BridgeError::Native(e.to_string()))?;
        Ok(Self::reader(records))
    }

    fn next_record(&mut self) -> BridgeResult<&SyncRecord> {
        let record = self.records.get(self.cursor).ok_or_else(|| {
            BridgeError::Native(format!(
                "Sync stream ended after {} records",
                self.records.len()
            ))
        })?;
        self.cursor += 1;
        Ok(record)
    }

    fn exchange(&mut self, name: &str, value: SyncValue) -> BridgeResult<SyncValue> {
        if self.direction == SyncDirection::Write {
            self.records.push(SyncRecord::Value {
                name: name.to_string(),
                value: value.clone(),
            });
            return Ok(value);
        }

        let position = self.cursor;
        match self.next_record()? {
            SyncRecord::Value {
                name: stored_name,
                value: stored,
            } if stored_name == name && stored.kind() == value.kind() => Ok(stored.clone()),
            other => Err(BridgeError::Native(format!(
                "Sync mismatch at record {position}: expected {} `{name}`, found {other:?}",
                value.kind()
            ))),
        }
    }
}

impl Default for MemorySync {
    fn default() -> Self {
        Self::writer()
    }
}

macro_rules! exchange_value {
    ($self:ident, $name:ident, $value:ident, $variant:ident) => {{
        if let SyncValue::$variant(loaded) =
            $self.exchange($name, SyncValue::$variant($value.clone()))?
        {
            *$value = loaded;
        }
        Ok(())
    }};
}

impl SyncContext for MemorySync {
    fn direction(&self) -> SyncDirection {
        self.direction
    }

    fn begin_group(&mut self, name: &str) -> BridgeResult<()> {
        self.open_groups.push(name.to_string());
        if self.direction == SyncDirection::Write {
            self.records.push(SyncRecord::BeginGroup(name.to_string()));
            return Ok(());
        }

        let position = self.cursor;
        match self.next_record()? {
            SyncRecord::BeginGroup(stored) if stored == name => Ok(()),
            other => Err(BridgeError::Native(format!(
                "Sync mismatch at record {position}: expected group `{name}`, found {other:?}"
            ))),
        }
    }

    fn end_group(&mut self) -> BridgeResult<()> {
        let group = self
            .open_groups
            .pop()
            .ok_or_else(|| BridgeError::InvalidState("end_group without begin_group".to_string()))?;
        if self.direction == SyncDirection::Write {
            self.records.push(SyncRecord::EndGroup);
            return Ok(());
        }

        let position = self.cursor;
        match self.next_record()? {
            SyncRecord::EndGroup => Ok(()),
            other => Err(BridgeError::Native(format!(
                "Sync mismatch at record {position}: expected end of `{group}`, found {other:?}"
            ))),
        }
    }

    fn value_f32(&mut self, name: &str, value: &mut f32) -> BridgeResult<()> {
        exchange_value!(self, name, value, F32)
    }

    fn value_i32(&mut self, name: &str, value: &mut i32) -> BridgeResult<()> {
        exchange_value!(self, name, value, I32)
    }

    fn value_bool(&mut self, name: &str, value: &mut bool) -> BridgeResult<()> {
        exchange_value!(self, name, value, Bool)
    }

    fn value_vec3(&mut self, name: &str, value: &mut Vec3) -> BridgeResult<()> {
        exchange_value!(self, name, value, Vec3)
    }

    fn value_string(&mut self, name: &str, value: &mut String) -> BridgeResult<()> {
        exchange_value!(self, name, value, String)
    }
}
