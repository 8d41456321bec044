//! Form controls and their declared constraints

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// CONTROL KIND
// ============================================================================

/// The kind of a form control, as given by its HTML `type` (or tag).
///
/// Parsing is case-insensitive and never fails: unknown types are treated as
/// `text`, the way browsers do. Serde goes through the same parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum ControlKind {
    #[default]
    Text,
    Password,
    Email,
    Number,
    Range,
    Date,
    Time,
    Month,
    Week,
    DatetimeLocal,
    Tel,
    Url,
    Search,
    Color,
    Textarea,
    Select,
    Checkbox,
    Radio,
    File,
    Hidden,
    Button,
    Submit,
    Reset,
    Image,
    Fieldset,
    Object,
    Keygen,
    Output,
}

impl ControlKind {
    /// Parses an HTML type string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "password" => Self::Password,
            "email" => Self::Email,
            "number" => Self::Number,
            "range" => Self::Range,
            "date" => Self::Date,
            "time" => Self::Time,
            "month" => Self::Month,
            "week" => Self::Week,
            "datetime-local" => Self::DatetimeLocal,
            "tel" => Self::Tel,
            "url" => Self::Url,
            "search" => Self::Search,
            "color" => Self::Color,
            "textarea" => Self::Textarea,
            "select" | "select-one" | "select-multiple" => Self::Select,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "file" => Self::File,
            "hidden" => Self::Hidden,
            "button" => Self::Button,
            "submit" => Self::Submit,
            "reset" => Self::Reset,
            "image" => Self::Image,
            "fieldset" => Self::Fieldset,
            "object" => Self::Object,
            "keygen" => Self::Keygen,
            "output" => Self::Output,
            _ => Self::Text,
        }
    }

    /// The HTML type string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Email => "email",
            Self::Number => "number",
            Self::Range => "range",
            Self::Date => "date",
            Self::Time => "time",
            Self::Month => "month",
            Self::Week => "week",
            Self::DatetimeLocal => "datetime-local",
            Self::Tel => "tel",
            Self::Url => "url",
            Self::Search => "search",
            Self::Color => "color",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::File => "file",
            Self::Hidden => "hidden",
            Self::Button => "button",
            Self::Submit => "submit",
            Self::Reset => "reset",
            Self::Image => "image",
            Self::Fieldset => "fieldset",
            Self::Object => "object",
            Self::Keygen => "keygen",
            Self::Output => "output",
        }
    }

    /// Structural and button-like controls never take part in form validation.
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Fieldset
                | Self::Object
                | Self::Button
                | Self::Hidden
                | Self::Keygen
                | Self::Output
                | Self::Reset
                | Self::Submit
        )
    }

    /// Whether auto-trim may rewrite the value of this kind.
    #[must_use]
    pub fn is_trimmable(self) -> bool {
        !matches!(self, Self::Checkbox | Self::File | Self::Radio | Self::Select)
    }

    /// Controls that submit the form when clicked.
    #[must_use]
    pub fn is_submit(self) -> bool {
        matches!(self, Self::Submit | Self::Image)
    }

    /// Controls whose activation by click is itself a value change.
    #[must_use]
    pub fn changes_on_click(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio | Self::Select)
    }

    /// Controls that carry a user-editable value (input, select, textarea).
    #[must_use]
    pub fn holds_value(self) -> bool {
        !matches!(self, Self::Fieldset | Self::Object | Self::Keygen | Self::Output)
    }
}

impl FromStr for ControlKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for ControlKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ControlKind> for &'static str {
    fn from(kind: ControlKind) -> Self {
        kind.as_str()
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FIELD ID
// ============================================================================

/// Position of a field in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub usize);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// CONSTRAINTS
// ============================================================================

/// Declared constraint attributes of a field.
///
/// Bounds are kept as the raw attribute text: a malformed bound is not a
/// construction error, it simply fails the rule that reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// `required` marker.
    pub required: bool,
    /// Named pattern, inline regex, or `||`-joined alternatives.
    pub pattern: Option<String>,
    /// Lower bound (number or `YYYY-MM-DD`).
    pub min: Option<String>,
    /// Upper bound (number or `YYYY-MM-DD`).
    pub max: Option<String>,
    /// Step (decimal, days for dates, or `any`).
    pub step: Option<String>,
    /// Maximum value length in characters.
    pub max_length: Option<String>,
    /// Multiple selection / comma-separated addresses.
    pub multiple: bool,
    /// Name of the field this one must equal.
    pub match_target: Option<String>,
    /// Value is also checked by the remote endpoint.
    pub remote: bool,
    /// Value is sent with every remote request for correlation.
    pub uid: bool,
}

// ============================================================================
// FIELD
// ============================================================================

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Submitted value.
    pub value: String,
    /// Selection state.
    #[serde(default)]
    pub selected: bool,
}

/// A single form control.
///
/// # Examples
///
/// ```rust,ignore
/// use formcheck::{ControlKind, Field};
///
/// let age = Field::new("age", ControlKind::Number)
///     .with_value("42")
///     .min("18")
///     .step("1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Control name; radios of one group share it.
    pub name: String,
    /// Control kind.
    #[serde(default)]
    pub kind: ControlKind,
    /// Current value. For selects, see [`Field::current_value`].
    #[serde(default)]
    pub value: String,
    /// Checked state (checkbox, radio).
    #[serde(default)]
    pub checked: bool,
    /// Disabled controls are skipped by form validation.
    #[serde(default)]
    pub disabled: bool,
    /// Read-only controls are skipped by form validation.
    #[serde(default)]
    pub read_only: bool,
    /// Options of a select control.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Declared constraints.
    #[serde(default)]
    pub constraints: Constraints,
}

impl Field {
    /// Creates an empty, enabled field.
    pub fn new(name: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: String::new(),
            checked: false,
            disabled: false,
            read_only: false,
            options: Vec::new(),
            constraints: Constraints::default(),
        }
    }

    /// The value the control would submit.
    ///
    /// A select reports its first selected option (empty when none is).
    #[must_use]
    pub fn current_value(&self) -> &str {
        if self.kind == ControlKind::Select {
            return self
                .options
                .iter()
                .find(|o| o.selected)
                .map_or("", |o| o.value.as_str());
        }
        self.value.as_str()
    }

    /// Replaces the value; for selects, selects the matching option(s).
    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.kind == ControlKind::Select {
            for option in &mut self.options {
                option.selected = option.value == value;
            }
        }
        self.value = value;
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_option(mut self, value: impl Into<String>, selected: bool) -> Self {
        self.options.push(SelectOption {
            value: value.into(),
            selected,
        });
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn min(mut self, min: impl Into<String>) -> Self {
        self.constraints.min = Some(min.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn max(mut self, max: impl Into<String>) -> Self {
        self.constraints.max = Some(max.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.constraints.step = Some(step.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn max_length(mut self, max_length: impl Into<String>) -> Self {
        self.constraints.max_length = Some(max_length.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn multiple(mut self) -> Self {
        self.constraints.multiple = true;
        self
    }

    /// Requires this field to equal the field named `target`.
    #[must_use = "builder methods must be chained or built"]
    pub fn matches(mut self, target: impl Into<String>) -> Self {
        self.constraints.match_target = Some(target.into());
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn remote(mut self) -> Self {
        self.constraints.remote = true;
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn uid(mut self) -> Self {
        self.constraints.uid = true;
        self
    }
}
