//! Inspector-exposed entity properties
//!
//! Each entity class declares its editable properties once at registration.
//! The descriptors are validated then, cached per class and afterwards used
//! to exchange values with native code as strings, by index.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::foundation::math::{Vec2, Vec3};

/// Semantic type tag native code uses to pick the inspector row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditablePropertyType {
    /// Flag
    Bool,
    /// Integer
    Int,
    /// Floating point number
    Float,
    /// 3D vector
    Vector,
    /// RGB color
    Color,
    /// Text
    String,
    /// Path to a file
    File,
    /// Path to a texture
    Texture,
    /// Path to a geometry object
    Object,
    /// Sound name
    Sound,
    /// Dialogue name
    Dialogue,
    /// Sequence name
    Sequence,
    /// Start of an inspector folder
    FolderBegin,
    /// End of an inspector folder
    FolderEnd,
}

/// Explicit tag of the value type a property holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i32`
    Int,
    /// `f32`
    Float,
    /// `Vec3`
    Vector3,
    /// `String`
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "i32",
            Self::Float => "f32",
            Self::Vector3 => "Vec3",
            Self::String => "String",
        };
        f.write_str(name)
    }
}

/// Inspector control used to edit a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiControl {
    /// Floating point number box
    NumberEdit,
    /// Integer box
    IntEdit,
    /// Check box
    CheckBox,
    /// Three-component vector box
    VectorEdit,
    /// Color picker
    ColorPicker,
    /// Text box
    TextEdit,
    /// File browser
    FileBrowser,
    /// Texture browser
    TextureBrowser,
    /// Geometry object browser
    ObjectBrowser,
    /// Sound browser
    SoundBrowser,
    /// Dialogue browser
    DialogueBrowser,
    /// Sequence browser
    SequenceBrowser,
}

/// Edit-type prefix and value type that belong to a [`UiControl`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiControlInfo {
    /// Prefix native code uses to choose the control
    pub prefix: &'static str,
    /// Value type the control edits
    pub value_kind: ValueKind,
}

impl UiControl {
    /// Prefix and value type of this control
    pub const fn info(self) -> UiControlInfo {
        let (prefix, value_kind) = match self {
            Self::NumberEdit => ("n", ValueKind::Float),
            Self::IntEdit => ("i", ValueKind::Int),
            Self::CheckBox => ("b", ValueKind::Bool),
            Self::VectorEdit => ("vector", ValueKind::Vector3),
            Self::ColorPicker => ("clr", ValueKind::Vector3),
            Self::TextEdit => ("s", ValueKind::String),
            Self::FileBrowser => ("file", ValueKind::String),
            Self::TextureBrowser => ("tex", ValueKind::String),
            Self::ObjectBrowser => ("object", ValueKind::String),
            Self::SoundBrowser => ("sound", ValueKind::String),
            Self::DialogueBrowser => ("dialog", ValueKind::String),
            Self::SequenceBrowser => ("seq", ValueKind::String),
        };
        UiControlInfo { prefix, value_kind }
    }
}

/// Loosely typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Flag
    Bool(bool),
    /// Integer
    Int(i32),
    /// Floating point number
    Float(f32),
    /// Vector or color
    Vector3(Vec3),
    /// Text
    String(String),
}

impl PropertyValue {
    /// Value type tag
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Vector3(_) => ValueKind::Vector3,
            Self::String(_) => ValueKind::String,
        }
    }

    /// Parse the text native code sends for a property of type `kind`
    ///
    /// Numbers, booleans and vectors ignore surrounding whitespace; strings
    /// are kept exactly as sent.
    pub fn parse(kind: ValueKind, text: &str) -> BridgeResult<Self> {
        if kind == ValueKind::String {
            return Ok(Self::String(text.to_string()));
        }

        let text = text.trim();
        let invalid = || BridgeError::argument("value", format!("`{text}` is not a valid {kind}"));

        match kind {
            ValueKind::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Self::Bool(true)),
                "false" | "0" => Ok(Self::Bool(false)),
                _ => Err(invalid()),
            },
            ValueKind::Int => text.parse().map(Self::Int).map_err(|_| invalid()),
            ValueKind::Float => text.parse().map(Self::Float).map_err(|_| invalid()),
            ValueKind::Vector3 => {
                let components = text
                    .split(',')
                    .map(|part| part.trim().parse::<f32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| invalid())?;
                match components.as_slice() {
                    [x, y, z] => Ok(Self::Vector3(Vec3::new(*x, *y, *z))),
                    _ => Err(invalid()),
                }
            }
            ValueKind::String => Ok(Self::String(text.to_string())),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Vector3(value) => write!(f, "{},{},{}", value.x, value.y, value.z),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// Rust types that can back an editable property
pub trait PropertyType: Sized + 'static {
    /// Value type tag
    const KIND: ValueKind;

    /// Wrap into a loosely typed value
    fn into_value(self) -> PropertyValue;

    /// Unwrap a loosely typed value of the right kind
    fn from_value(value: PropertyValue) -> Option<Self>;
}

macro_rules! property_type {
    ($ty:ty, $variant:ident) => {
        impl PropertyType for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn into_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_value(value: PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

property_type!(bool, Bool);
property_type!(i32, Int);
property_type!(f32, Float);
property_type!(Vec3, Vector3);
property_type!(String, String);

/// Inspector metadata attached to a property declaration
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAttribute {
    /// Control used to edit the property
    pub ui_control: UiControl,
    /// Tooltip text
    pub description: String,
    /// Minimum and maximum value
    pub limits: Vec2,
    /// Value shown for new entities
    pub default_value: Option<PropertyValue>,
}

impl PropertyAttribute {
    /// Attribute with no limits and no default
    pub fn new(ui_control: UiControl, description: impl Into<String>) -> Self {
        Self {
            ui_control,
            description: description.into(),
            limits: Vec2::zeros(),
            default_value: None,
        }
    }

    /// Set minimum and maximum values
    #[must_use]
    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        self.limits = Vec2::new(min, max);
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, value: impl PropertyType) -> Self {
        self.default_value = Some(value.into_value());
        self
    }
}

/// Declaration of one property member before validation
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMember {
    /// Member name
    pub name: String,
    /// Type the member actually holds
    pub member_kind: ValueKind,
    /// Semantic tag
    pub property_type: EditablePropertyType,
    /// Inspector metadata, if declared
    pub attribute: Option<PropertyAttribute>,
}

/// Validated description of one inspector row, in the shape native code consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditablePropertyInfo {
    /// Property name
    pub name: String,
    /// Semantic tag
    pub property_type: EditablePropertyType,
    /// Edit-type prefix of the control
    pub edit_type: String,
    /// Tooltip text
    pub description: String,
    /// Unused by native code, always zero
    pub flags: u32,
    /// Minimum and maximum value
    pub limits: Vec2,
    /// Text form of the default value; empty when none was given
    pub default_value: String,
}

impl EditablePropertyInfo {
    /// Validate a member declaration
    pub fn from_member(member: &PropertyMember) -> BridgeResult<Self> {
        let attribute = member.attribute.as_ref().ok_or_else(|| {
            BridgeError::Registration(format!(
                "Invalid member {} was passed to EditablePropertyInfo: it has no editable property attribute",
                member.name
            ))
        })?;

        let control = attribute.ui_control.info();
        if control.value_kind != member.member_kind {
            return Err(BridgeError::Registration(format!(
                "Ui control specified for the property {} of type {} cannot be used: it works only with properties of type {}",
                member.name, member.member_kind, control.value_kind
            )));
        }

        let default_value = match &attribute.default_value {
            None => String::new(),
            Some(value) if value.kind() != control.value_kind => {
                return Err(BridgeError::Registration(format!(
                    "Default value for the property {} of type {} is of incompatible type {}.",
                    member.name,
                    member.member_kind,
                    value.kind()
                )))
            }
            Some(value) => value.to_string(),
        };

        Ok(Self {
            name: member.name.clone(),
            property_type: member.property_type,
            edit_type: control.prefix.to_string(),
            description: attribute.description.clone(),
            flags: 0,
            limits: attribute.limits,
            default_value,
        })
    }

    /// Folder marker carrying only a name and a tag
    pub fn folder(name: impl Into<String>, start: bool) -> Self {
        Self {
            name: name.into(),
            property_type: if start {
                EditablePropertyType::FolderBegin
            } else {
                EditablePropertyType::FolderEnd
            },
            edit_type: String::new(),
            description: String::new(),
            flags: 0,
            limits: Vec2::zeros(),
            default_value: String::new(),
        }
    }

    /// Whether this is a folder marker
    pub const fn is_folder(&self) -> bool {
        matches!(
            self.property_type,
            EditablePropertyType::FolderBegin | EditablePropertyType::FolderEnd
        )
    }
}

type Getter = Box<dyn Fn(&dyn Any) -> Option<PropertyValue>>;
type Setter = Box<dyn Fn(&mut dyn Any, PropertyValue) -> Option<()>>;

struct Accessor {
    kind: ValueKind,
    owner: &'static str,
    get: Getter,
    set: Setter,
}

/// Descriptor plus typed accessors of one property
pub struct EditableProperty {
    info: EditablePropertyInfo,
    accessor: Option<Accessor>,
}

impl EditableProperty {
    /// Declare a property of `T` backed by a value of type `V`
    ///
    /// Fails if the attribute is missing or does not fit `V`.
    pub fn new<T, V>(
        name: impl Into<String>,
        property_type: EditablePropertyType,
        attribute: Option<PropertyAttribute>,
        get: impl Fn(&T) -> V + 'static,
        set: impl Fn(&mut T, V) + 'static,
    ) -> BridgeResult<Self>
    where
        T: Any,
        V: PropertyType,
    {
        let member = PropertyMember {
            name: name.into(),
            member_kind: V::KIND,
            property_type,
            attribute,
        };
        let info = EditablePropertyInfo::from_member(&member)?;

        let accessor = Accessor {
            kind: V::KIND,
            owner: std::any::type_name::<T>(),
            get: Box::new(move |target: &dyn Any| {
                target
                    .downcast_ref::<T>()
                    .map(|target| get(target).into_value())
            }),
            set: Box::new(move |target: &mut dyn Any, value: PropertyValue| {
                let target = target.downcast_mut::<T>()?;
                set(target, V::from_value(value)?);
                Some(())
            }),
        };

        Ok(Self {
            info,
            accessor: Some(accessor),
        })
    }

    /// Folder marker with no value
    pub fn folder(name: impl Into<String>, start: bool) -> Self {
        Self {
            info: EditablePropertyInfo::folder(name, start),
            accessor: None,
        }
    }

    /// Validated descriptor
    pub const fn info(&self) -> &EditablePropertyInfo {
        &self.info
    }

    /// Read the property of `target` as text
    pub fn get(&self, target: &dyn Any) -> BridgeResult<String> {
        let accessor = self.accessor()?;
        (accessor.get)(target)
            .map(|value| value.to_string())
            .ok_or_else(|| self.wrong_owner(accessor))
    }

    /// Parse `text` and write it into the property of `target`
    pub fn set(&self, target: &mut dyn Any, text: &str) -> BridgeResult<()> {
        let accessor = self.accessor()?;
        let value = PropertyValue::parse(accessor.kind, text)?;
        (accessor.set)(target, value).ok_or_else(|| self.wrong_owner(accessor))
    }

    fn accessor(&self) -> BridgeResult<&Accessor> {
        self.accessor.as_ref().ok_or_else(|| {
            BridgeError::InvalidState(format!(
                "{} is a folder marker and has no value",
                self.info.name
            ))
        })
    }

    fn wrong_owner(&self, accessor: &Accessor) -> BridgeError {
        BridgeError::InvalidState(format!(
            "Property {} can only be accessed on {}",
            self.info.name, accessor.owner
        ))
    }
}

impl fmt::Debug for EditableProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableProperty")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Ordered property list of one entity class
#[derive(Debug, Default)]
pub struct PropertyTable {
    properties: Vec<EditableProperty>,
}

impl PropertyTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property
    #[must_use]
    pub fn with(mut self, property: EditableProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Open a folder
    #[must_use]
    pub fn begin_folder(self, name: impl Into<String>) -> Self {
        self.with(EditableProperty::folder(name, true))
    }

    /// Close a folder
    #[must_use]
    pub fn end_folder(self, name: impl Into<String>) -> Self {
        self.with(EditableProperty::folder(name, false))
    }

    /// Number of rows, folder markers included
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Row by index
    pub fn get(&self, index: usize) -> BridgeResult<&EditableProperty> {
        self.properties.get(index).ok_or_else(|| {
            BridgeError::out_of_range(
                "index",
                format!("{index} is outside of a table with {} properties", self.len()),
            )
        })
    }

    /// Descriptors in order
    pub fn infos(&self) -> Vec<EditablePropertyInfo> {
        self.properties.iter().map(|p| p.info.clone()).collect()
    }

    /// Rows in order
    pub fn iter(&self) -> impl Iterator<Item = &EditableProperty> + '_ {
        self.properties.iter()
    }
}
