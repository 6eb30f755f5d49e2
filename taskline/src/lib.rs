//! Task-line parsing for markdown notes.
//! A line such as `- [ ] Pay rent 🔼 📅 2025-02-01 #home` is split into its list skeleton
//! and a typed record of fields, and can be rendered back in either marker dialect.

pub mod core {
    use chrono::NaiveDate;
    use indexmap::{IndexMap, IndexSet};
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /* ------------------------------ Priority ------------------------------ */

    /// Six ordered levels; sorts most urgent first, `None` sits between medium and low.
    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    )]
    #[serde(rename_all = "lowercase")]
    pub enum Priority {
        Highest,
        High,
        Medium,
        #[default]
        None,
        Low,
        Lowest,
    }

    impl Priority {
        pub const ALL: [Priority; 6] = [
            Priority::Highest,
            Priority::High,
            Priority::Medium,
            Priority::None,
            Priority::Low,
            Priority::Lowest,
        ];

        /// Map a raw priority token to its level. Accepts the glyphs and the words
        /// (any case); anything else is `None`.
        pub fn from_token(token: &str) -> Self {
            match token.trim().trim_end_matches('\u{FE0F}') {
                "🔺" => Self::Highest,
                "⏫" => Self::High,
                "🔼" => Self::Medium,
                "🔽" => Self::Low,
                "⏬" => Self::Lowest,
                word => match word.to_ascii_lowercase().as_str() {
                    "highest" => Self::Highest,
                    "high" => Self::High,
                    "medium" => Self::Medium,
                    "low" => Self::Low,
                    "lowest" => Self::Lowest,
                    _ => Self::None,
                },
            }
        }

        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Highest => "highest",
                Self::High => "high",
                Self::Medium => "medium",
                Self::None => "none",
                Self::Low => "low",
                Self::Lowest => "lowest",
            }
        }
    }

    impl fmt::Display for Priority {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /* ----------------------------- Field keys ----------------------------- */

    /// Keys under which built-in fields are extracted. Extension keys may not reuse them.
    pub mod keys {
        pub const PRIORITY: &str = "priority";
        pub const START_DATE: &str = "startDate";
        pub const CREATED_DATE: &str = "createdDate";
        pub const SCHEDULED_DATE: &str = "scheduledDate";
        pub const DUE_DATE: &str = "dueDate";
        pub const DONE_DATE: &str = "doneDate";
        pub const CANCELLED_DATE: &str = "cancelledDate";
        pub const RECURRENCE: &str = "recurrence";
        pub const ID: &str = "id";
        pub const BLOCKED_BY: &str = "blockedBy";
        pub const TAGS: &str = "tags";

        /// Keys a dialect table may define, in extraction order.
        pub const DIALECT: [&str; 10] = [
            PRIORITY,
            DONE_DATE,
            CANCELLED_DATE,
            DUE_DATE,
            SCHEDULED_DATE,
            START_DATE,
            CREATED_DATE,
            RECURRENCE,
            ID,
            BLOCKED_BY,
        ];

        pub fn is_builtin(key: &str) -> bool {
            key == TAGS || DIALECT.contains(&key)
        }
    }

    /// The six date fields, named for lookups and rendering.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum DateField {
        Start,
        Created,
        Scheduled,
        Due,
        Done,
        Cancelled,
    }

    impl DateField {
        pub const ALL: [DateField; 6] = [
            DateField::Start,
            DateField::Created,
            DateField::Scheduled,
            DateField::Due,
            DateField::Done,
            DateField::Cancelled,
        ];

        pub fn key(&self) -> &'static str {
            match self {
                Self::Start => keys::START_DATE,
                Self::Created => keys::CREATED_DATE,
                Self::Scheduled => keys::SCHEDULED_DATE,
                Self::Due => keys::DUE_DATE,
                Self::Done => keys::DONE_DATE,
                Self::Cancelled => keys::CANCELLED_DATE,
            }
        }
    }

    /* ------------------------------- Records ------------------------------- */

    /// Syntactic skeleton of a task line, before any field extraction.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TaskComponents {
        pub indentation: String,
        pub list_marker: String,
        pub status: String,
        /// Text after the checkbox, trimmed, with the block anchor removed.
        pub body: String,
        /// Trailing `^anchor`, or empty.
        pub block_link: String,
    }

    /// Normalized record of one task line.
    #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TaskDetails {
        /// Free text left after extraction, tags included.
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub priority: Priority,

        /// Raw `YYYY-MM-DD` strings; never validated as calendar dates.
        pub start_date: Option<String>,
        pub created_date: Option<String>,
        pub scheduled_date: Option<String>,
        pub due_date: Option<String>,
        pub done_date: Option<String>,
        pub cancelled_date: Option<String>,

        /// Unparsed recurrence text such as `every week on Monday`.
        #[serde(default)]
        pub recurrence_rule: String,
        #[serde(default)]
        pub id: String,
        #[serde(default)]
        pub blocked_by: Vec<String>,

        /// Every `#tag` in the description, deduplicated, first-seen order.
        #[serde(default)]
        pub tags: IndexSet<String>,

        #[serde(default)]
        pub block_link: String,
        #[serde(default)]
        pub indentation: String,
        #[serde(default)]
        pub list_marker: String,
        #[serde(default)]
        pub status: String,

        /// Values captured by caller-registered extension fields.
        #[serde(default)]
        pub extensions: IndexMap<String, Option<String>>,
    }

    impl TaskDetails {
        pub fn date(&self, field: DateField) -> Option<&str> {
            let value = match field {
                DateField::Start => &self.start_date,
                DateField::Created => &self.created_date,
                DateField::Scheduled => &self.scheduled_date,
                DateField::Due => &self.due_date,
                DateField::Done => &self.done_date,
                DateField::Cancelled => &self.cancelled_date,
            };
            value.as_deref()
        }

        /// Calendar view of a date field; `None` when absent or not a real date.
        pub fn naive_date(&self, field: DateField) -> Option<NaiveDate> {
            NaiveDate::parse_from_str(self.date(field)?, "%Y-%m-%d").ok()
        }
    }

    /* ------------------------------- Errors ------------------------------- */

    #[derive(Debug, thiserror::Error)]
    pub enum TaskLineError {
        #[error("invalid pattern for field `{key}`: {source}")]
        InvalidPattern {
            key: String,
            #[source]
            source: regex::Error,
        },
        #[error("extension key `{0}` collides with a built-in field")]
        ReservedKey(String),
        #[error("field `{0}` is defined more than once")]
        DuplicateKey(String),
        #[error("`{0}` is not a field a dialect table can define")]
        UnknownField(String),
        #[error("field `{key}` reads capture group {group} but its pattern has {available}")]
        GroupOutOfRange {
            key: String,
            group: usize,
            available: usize,
        },
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn priority_tokens_map_to_levels() {
            assert_eq!(Priority::from_token("🔺"), Priority::Highest);
            assert_eq!(Priority::from_token("⏫"), Priority::High);
            assert_eq!(Priority::from_token("🔼\u{FE0F}"), Priority::Medium);
            assert_eq!(Priority::from_token("⏬"), Priority::Lowest);
            assert_eq!(Priority::from_token("Low"), Priority::Low);
            assert_eq!(Priority::from_token(" none "), Priority::None);
            assert_eq!(Priority::from_token("urgent"), Priority::None);
        }

        #[test]
        fn priority_order_puts_none_between_medium_and_low() {
            let mut levels = vec![Priority::Low, Priority::None, Priority::Highest, Priority::Medium];
            levels.sort();
            assert_eq!(
                levels,
                vec![Priority::Highest, Priority::Medium, Priority::None, Priority::Low]
            );
        }

        #[test]
        fn naive_date_rejects_impossible_days_but_keeps_raw_value() {
            let task = TaskDetails {
                due_date: Some("2024-02-30".into()),
                start_date: Some("2024-02-29".into()),
                ..TaskDetails::default()
            };
            assert_eq!(task.date(DateField::Due), Some("2024-02-30"));
            assert_eq!(task.naive_date(DateField::Due), None);
            assert_eq!(
                task.naive_date(DateField::Start),
                NaiveDate::from_ymd_opt(2024, 2, 29)
            );
            assert_eq!(task.date(DateField::Done), None);
        }

        #[test]
        fn details_serialize_with_camel_case_names() {
            let task = TaskDetails {
                description: "Hello".into(),
                priority: Priority::High,
                created_date: Some("2024-01-25".into()),
                blocked_by: vec!["abc".into()],
                ..TaskDetails::default()
            };
            let json = serde_json::to_value(&task).expect("serialize");
            assert_eq!(json["createdDate"], "2024-01-25");
            assert_eq!(json["priority"], "high");
            assert_eq!(json["blockedBy"][0], "abc");
            assert!(json["dueDate"].is_null());
        }

        #[test]
        fn details_deserialize_from_sparse_json() {
            let task: TaskDetails =
                serde_json::from_str(r#"{ "description": "Hello", "dueDate": "2024-02-01" }"#)
                    .expect("deserialize");
            assert_eq!(task.description, "Hello");
            assert_eq!(task.priority, Priority::None);
            assert_eq!(task.due_date.as_deref(), Some("2024-02-01"));
            assert_eq!(task.status, "");
            assert!(task.list_marker.is_empty() && task.indentation.is_empty());
        }

        #[test]
        fn builtin_keys_are_reserved() {
            assert!(keys::is_builtin("dueDate"));
            assert!(keys::is_builtin("tags"));
            assert!(!keys::is_builtin("pomodoros"));
        }
    }
}

pub mod dialect {
    //! Dialect tables: which marker encodes which field, for matching and for rendering.
    //!
    //! A dialect is data. Both built-in tables produce the same keys and go through the
    //! same extraction engine; only the surface syntax differs.

    use crate::core::{DateField, Priority, TaskLineError, keys};
    use once_cell::sync::Lazy;
    use regex::{Captures, Regex};
    use serde::{Deserialize, Serialize};
    use std::{collections::HashSet, fmt, ops::Range, sync::Arc};

    /* ------------------------------ Patterns ------------------------------ */

    /// How an inner pattern is anchored and wrapped when compiled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum PatternStyle {
        /// Bare token at the trailing edge; also swept out of prose once trailing tokens run out.
        #[default]
        Symbol,
        /// `[label:: value]` or `(label:: value)` at the trailing edge, same sweep.
        InlineField,
        /// Compiled verbatim; the caller supplies its own anchors. Never swept.
        Raw,
    }

    /// Wrap an inner `label:: value` pattern so it matches inside `[...]` or `(...)`,
    /// with an optional trailing comma.
    ///
    /// Brackets cannot be mixed within one token. The inner pattern is repeated once per
    /// bracket style, so its groups appear twice; [`FieldCaptures::get`] folds them back
    /// so group numbers mean the same thing in every dialect.
    pub fn inline_field_pattern(inner: &str) -> String {
        format!(r"(?:\[ *(?:{inner}) *\]|\( *(?:{inner}) *\))(?: *,)?")
    }

    /// A compiled field pattern.
    #[derive(Debug, Clone)]
    pub struct FieldPattern {
        trailing: Regex,
        embedded: Option<Regex>,
        groups: usize,
        alternatives: usize,
    }

    impl FieldPattern {
        pub fn compile(style: PatternStyle, inner: &str) -> Result<Self, regex::Error> {
            let groups = Regex::new(inner)?.captures_len() - 1;
            match style {
                PatternStyle::Symbol => Ok(Self {
                    trailing: Regex::new(&format!("(?:{inner})$"))?,
                    embedded: Some(Regex::new(inner)?),
                    groups,
                    alternatives: 1,
                }),
                PatternStyle::InlineField => {
                    let wrapped = inline_field_pattern(inner);
                    Ok(Self {
                        trailing: Regex::new(&format!("{wrapped}$"))?,
                        embedded: Some(Regex::new(&wrapped)?),
                        groups,
                        alternatives: 2,
                    })
                }
                PatternStyle::Raw => Ok(Self {
                    trailing: Regex::new(inner)?,
                    embedded: None,
                    groups,
                    alternatives: 1,
                }),
            }
        }

        pub fn symbol(inner: &str) -> Result<Self, regex::Error> {
            Self::compile(PatternStyle::Symbol, inner)
        }

        pub fn inline_field(inner: &str) -> Result<Self, regex::Error> {
            Self::compile(PatternStyle::InlineField, inner)
        }

        pub fn raw(pattern: &str) -> Result<Self, regex::Error> {
            Self::compile(PatternStyle::Raw, pattern)
        }

        /// Number of capture groups in the inner pattern.
        pub fn groups(&self) -> usize {
            self.groups
        }

        pub fn find_trailing<'h>(&self, body: &'h str) -> Option<FieldCaptures<'h>> {
            self.trailing.captures(body).map(|caps| self.wrap(caps))
        }

        /// Rightmost unanchored occurrence, if this pattern may be swept from prose.
        pub fn find_embedded<'h>(&self, body: &'h str) -> Option<FieldCaptures<'h>> {
            let embedded = self.embedded.as_ref()?;
            embedded.captures_iter(body).last().map(|caps| self.wrap(caps))
        }

        fn wrap<'h>(&self, caps: Captures<'h>) -> FieldCaptures<'h> {
            FieldCaptures {
                caps,
                groups: self.groups,
                alternatives: self.alternatives,
            }
        }
    }

    /// One match of a [`FieldPattern`].
    #[derive(Debug)]
    pub struct FieldCaptures<'h> {
        caps: Captures<'h>,
        groups: usize,
        alternatives: usize,
    }

    impl<'h> FieldCaptures<'h> {
        /// The whole matched token, brackets included.
        pub fn token(&self) -> &'h str {
            self.caps.get(0).map_or("", |m| m.as_str())
        }

        pub fn span(&self) -> Range<usize> {
            self.caps.get(0).map_or(0..0, |m| m.range())
        }

        /// Inner capture group `index` (0 is the whole token), from whichever
        /// alternative matched.
        pub fn get(&self, index: usize) -> Option<&'h str> {
            if index == 0 {
                return Some(self.token());
            }
            if index > self.groups {
                return None;
            }
            (0..self.alternatives)
                .find_map(|alt| self.caps.get(alt * self.groups + index))
                .map(|m| m.as_str())
        }
    }

    /* ------------------------------ Fields ------------------------------ */

    pub type ValueTransform = Arc<dyn Fn(&FieldCaptures<'_>) -> Option<String> + Send + Sync>;

    /// A named matching rule: a pattern plus the function that turns a match into a value.
    #[derive(Clone)]
    pub struct FieldDefinition {
        key: String,
        pattern: FieldPattern,
        transform: ValueTransform,
    }

    impl FieldDefinition {
        pub fn new<F>(key: impl Into<String>, pattern: FieldPattern, transform: F) -> Self
        where
            F: Fn(&FieldCaptures<'_>) -> Option<String> + Send + Sync + 'static,
        {
            Self {
                key: key.into(),
                pattern,
                transform: Arc::new(transform),
            }
        }

        /// Stores the trimmed text of capture group `group`.
        pub fn capturing(
            key: impl Into<String>,
            pattern: FieldPattern,
            group: usize,
        ) -> Result<Self, TaskLineError> {
            let key = key.into();
            if group > pattern.groups() {
                return Err(TaskLineError::GroupOutOfRange {
                    key,
                    group,
                    available: pattern.groups(),
                });
            }
            Ok(Self::new(key, pattern, move |caps| {
                caps.get(group).map(|v| v.trim().to_string())
            }))
        }

        pub fn key(&self) -> &str {
            &self.key
        }

        pub fn pattern(&self) -> &FieldPattern {
            &self.pattern
        }

        pub fn value(&self, caps: &FieldCaptures<'_>) -> Option<String> {
            (self.transform)(caps)
        }
    }

    impl fmt::Debug for FieldDefinition {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FieldDefinition")
                .field("key", &self.key)
                .field("pattern", &self.pattern)
                .finish_non_exhaustive()
        }
    }

    /* ------------------------------ Markers ------------------------------ */

    /// How a marker and its value are written out.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum TokenStyle {
        /// `📅 2024-01-01`
        #[default]
        Bare,
        /// `[due:: 2024-01-01]`
        Bracketed,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PriorityMarkers {
        pub highest: String,
        pub high: String,
        pub medium: String,
        pub low: String,
        pub lowest: String,
        /// Usually empty: no priority is written as no token.
        #[serde(default)]
        pub none: String,
    }

    impl PriorityMarkers {
        pub fn marker(&self, priority: Priority) -> &str {
            match priority {
                Priority::Highest => &self.highest,
                Priority::High => &self.high,
                Priority::Medium => &self.medium,
                Priority::None => &self.none,
                Priority::Low => &self.low,
                Priority::Lowest => &self.lowest,
            }
        }
    }

    /// Human-readable markers used when rendering a task.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Markers {
        #[serde(default)]
        pub style: TokenStyle,
        pub priority: PriorityMarkers,
        pub start_date: String,
        pub created_date: String,
        pub scheduled_date: String,
        pub due_date: String,
        pub done_date: String,
        pub cancelled_date: String,
        pub recurrence: String,
        pub id: String,
        pub blocked_by: String,
    }

    impl Markers {
        pub fn date(&self, field: DateField) -> &str {
            match field {
                DateField::Start => &self.start_date,
                DateField::Created => &self.created_date,
                DateField::Scheduled => &self.scheduled_date,
                DateField::Due => &self.due_date,
                DateField::Done => &self.done_date,
                DateField::Cancelled => &self.cancelled_date,
            }
        }
    }

    /* ------------------------------ Dialect ------------------------------ */

    /// A complete, swappable marker table.
    #[derive(Debug, Clone)]
    pub struct Dialect {
        name: String,
        markers: Markers,
        fields: Vec<FieldDefinition>,
    }

    impl Dialect {
        /// Field keys must come from [`keys::DIALECT`], each at most once. Fields are tried
        /// in the order given.
        pub fn new(
            name: impl Into<String>,
            markers: Markers,
            fields: Vec<FieldDefinition>,
        ) -> Result<Self, TaskLineError> {
            let mut seen = HashSet::new();
            for field in &fields {
                if !keys::DIALECT.contains(&field.key()) {
                    return Err(TaskLineError::UnknownField(field.key().to_string()));
                }
                if !seen.insert(field.key()) {
                    return Err(TaskLineError::DuplicateKey(field.key().to_string()));
                }
            }
            Ok(Self {
                name: name.into(),
                markers,
                fields,
            })
        }

        /// Build a dialect from `(key, inner pattern)` pairs, all compiled in one style.
        /// Each field stores its first capture group, trimmed.
        pub fn from_table<'a>(
            name: impl Into<String>,
            style: PatternStyle,
            table: impl IntoIterator<Item = (&'a str, &'a str)>,
            markers: Markers,
        ) -> Result<Self, TaskLineError> {
            let fields = table
                .into_iter()
                .map(|(key, inner)| {
                    let pattern = FieldPattern::compile(style, inner).map_err(|source| {
                        TaskLineError::InvalidPattern {
                            key: key.to_string(),
                            source,
                        }
                    })?;
                    FieldDefinition::capturing(key, pattern, 1)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Self::new(name, markers, fields)
        }

        /// Emoji markers: `🔺 📅 2024-01-01 🔁 every week`. The default dialect.
        pub fn symbol() -> Self {
            SYMBOL.clone()
        }

        /// Inline fields: `[priority:: high] [due:: 2024-01-01]`.
        pub fn inline_field() -> Self {
            INLINE_FIELD.clone()
        }

        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn markers(&self) -> &Markers {
            &self.markers
        }

        pub fn fields(&self) -> &[FieldDefinition] {
            &self.fields
        }

        pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
            self.fields.iter().find(|f| f.key() == key)
        }
    }

    impl Default for Dialect {
        fn default() -> Self {
            Self::symbol()
        }
    }

    /* -------------------------- Built-in tables -------------------------- */

    const SYMBOL_TABLE: [(&str, &str); 10] = [
        (keys::PRIORITY, r"([🔺⏫🔼🔽⏬])\x{FE0F}?"),
        (keys::DONE_DATE, r"✅\x{FE0F}? *(\d{4}-\d{2}-\d{2})"),
        (keys::CANCELLED_DATE, r"❌\x{FE0F}? *(\d{4}-\d{2}-\d{2})"),
        (keys::DUE_DATE, r"[📅📆🗓]\x{FE0F}? *(\d{4}-\d{2}-\d{2})"),
        (keys::SCHEDULED_DATE, r"[⏳⌛]\x{FE0F}? *(\d{4}-\d{2}-\d{2})"),
        (keys::START_DATE, r"🛫\x{FE0F}? *(\d{4}-\d{2}-\d{2})"),
        (keys::CREATED_DATE, r"➕\x{FE0F}? *(\d{4}-\d{2}-\d{2})"),
        (keys::RECURRENCE, r"🔁\x{FE0F}? ?([a-zA-Z0-9, !]+)"),
        (keys::ID, r"(?i)🆔\x{FE0F}? *([a-z0-9]+)"),
        (keys::BLOCKED_BY, r"(?i)⛔\x{FE0F}? *([a-z0-9]+(?: *, *[a-z0-9]+ *)*)"),
    ];

    const INLINE_FIELD_TABLE: [(&str, &str); 10] = [
        (
            keys::PRIORITY,
            r"(?i)priority:: *(highest|high|medium|lowest|low|none)",
        ),
        (keys::DONE_DATE, r"completion:: *(\d{4}-\d{2}-\d{2})"),
        (keys::CANCELLED_DATE, r"cancelled:: *(\d{4}-\d{2}-\d{2})"),
        (keys::DUE_DATE, r"due:: *(\d{4}-\d{2}-\d{2})"),
        (keys::SCHEDULED_DATE, r"scheduled:: *(\d{4}-\d{2}-\d{2})"),
        (keys::START_DATE, r"start:: *(\d{4}-\d{2}-\d{2})"),
        (keys::CREATED_DATE, r"created:: *(\d{4}-\d{2}-\d{2})"),
        (keys::RECURRENCE, r"repeat:: *([a-zA-Z0-9, !]+)"),
        (keys::ID, r"(?i)id:: *([a-z0-9]+)"),
        (
            keys::BLOCKED_BY,
            r"(?i)blockedBy:: *([a-z0-9]+(?: *, *[a-z0-9]+ *)*)",
        ),
    ];

    fn symbol_markers() -> Markers {
        Markers {
            style: TokenStyle::Bare,
            priority: PriorityMarkers {
                highest: "🔺".into(),
                high: "⏫".into(),
                medium: "🔼".into(),
                low: "🔽".into(),
                lowest: "⏬".into(),
                none: String::new(),
            },
            start_date: "🛫".into(),
            created_date: "➕".into(),
            scheduled_date: "⏳".into(),
            due_date: "📅".into(),
            done_date: "✅".into(),
            cancelled_date: "❌".into(),
            recurrence: "🔁".into(),
            id: "🆔".into(),
            blocked_by: "⛔".into(),
        }
    }

    fn inline_field_markers() -> Markers {
        Markers {
            style: TokenStyle::Bracketed,
            priority: PriorityMarkers {
                highest: "priority:: highest".into(),
                high: "priority:: high".into(),
                medium: "priority:: medium".into(),
                low: "priority:: low".into(),
                lowest: "priority:: lowest".into(),
                none: String::new(),
            },
            start_date: "start::".into(),
            created_date: "created::".into(),
            scheduled_date: "scheduled::".into(),
            due_date: "due::".into(),
            done_date: "completion::".into(),
            cancelled_date: "cancelled::".into(),
            recurrence: "repeat::".into(),
            id: "id::".into(),
            blocked_by: "blockedBy::".into(),
        }
    }

    static SYMBOL: Lazy<Dialect> = Lazy::new(|| {
        Dialect::from_table("symbol", PatternStyle::Symbol, SYMBOL_TABLE, symbol_markers())
            .unwrap_or_else(|e| panic!("built-in symbol dialect is invalid: {e}"))
    });

    static INLINE_FIELD: Lazy<Dialect> = Lazy::new(|| {
        Dialect::from_table(
            "inline-field",
            PatternStyle::InlineField,
            INLINE_FIELD_TABLE,
            inline_field_markers(),
        )
        .unwrap_or_else(|e| panic!("built-in inline-field dialect is invalid: {e}"))
    });

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn inline_field_accepts_either_bracket_pair() {
            let p = FieldPattern::inline_field(r"due:: *(\d{4}-\d{2}-\d{2})").unwrap();
            let square = p.find_trailing("Pay rent [due:: 2024-02-01]").unwrap();
            assert_eq!(square.get(1), Some("2024-02-01"));
            let round = p.find_trailing("Pay rent (due:: 2024-02-01)").unwrap();
            assert_eq!(round.get(1), Some("2024-02-01"));
            assert_eq!(round.token(), "(due:: 2024-02-01)");
        }

        #[test]
        fn inline_field_rejects_mixed_brackets() {
            let p = FieldPattern::inline_field(r"due:: *(\d{4}-\d{2}-\d{2})").unwrap();
            assert!(p.find_trailing("Pay rent [due:: 2024-02-01)").is_none());
            assert!(p.find_trailing("Pay rent (due:: 2024-02-01]").is_none());
        }

        #[test]
        fn inline_field_allows_trailing_comma() {
            let p = FieldPattern::inline_field(r"due:: *(\d{4}-\d{2}-\d{2})").unwrap();
            let caps = p.find_trailing("Pay rent [due:: 2024-02-01] ,").unwrap();
            assert_eq!(caps.get(1), Some("2024-02-01"));
        }

        #[test]
        fn group_numbers_match_across_styles() {
            let inner = r"(?i)blockedBy:: *([a-z0-9]+( *, *[a-z0-9]+ *)*)";
            let inline = FieldPattern::inline_field(inner).unwrap();
            assert_eq!(inline.groups(), 2);
            let caps = inline.find_trailing("x (blockedBy:: ab, cd)").unwrap();
            assert_eq!(caps.get(1), Some("ab, cd"));
            assert_eq!(caps.get(2), Some(", cd"));
            assert_eq!(caps.get(3), None);

            let symbol = FieldPattern::symbol(r"(?i)⛔ *([a-z0-9]+( *, *[a-z0-9]+ *)*)").unwrap();
            let caps = symbol.find_trailing("x ⛔ ab, cd").unwrap();
            assert_eq!(caps.get(1), Some("ab, cd"));
            assert_eq!(caps.get(2), Some(", cd"));
        }

        #[test]
        fn trailing_form_only_matches_at_the_end() {
            let p = FieldPattern::symbol(r"📅 *(\d{4}-\d{2}-\d{2})").unwrap();
            assert!(p.find_trailing("📅 2024-01-01 later").is_none());
            let caps = p.find_embedded("📅 2024-01-01 later").unwrap();
            assert_eq!(caps.span(), 0.."📅 2024-01-01".len());
        }

        #[test]
        fn raw_patterns_are_never_swept() {
            let p = FieldPattern::raw(r"🍅 (\d+)$").unwrap();
            assert!(p.find_embedded("🍅 3 more").is_none());
            assert_eq!(p.find_trailing("focus 🍅 3").unwrap().get(1), Some("3"));
        }

        #[test]
        fn builtin_dialects_cover_every_key() {
            for dialect in [Dialect::symbol(), Dialect::inline_field()] {
                let found: Vec<&str> = dialect.fields().iter().map(|f| f.key()).collect();
                assert_eq!(found, keys::DIALECT.to_vec(), "{}", dialect.name());
            }
            assert_eq!(Dialect::default().name(), "symbol");
        }

        #[test]
        fn dialect_rejects_unknown_and_duplicate_keys() {
            let markers = Dialect::symbol().markers().clone();
            let unknown = Dialect::from_table(
                "x",
                PatternStyle::Symbol,
                [("whenever", r"@(\w+)")],
                markers.clone(),
            );
            assert!(matches!(unknown, Err(TaskLineError::UnknownField(k)) if k == "whenever"));

            let duplicate = Dialect::from_table(
                "x",
                PatternStyle::Symbol,
                [(keys::ID, r"@(\w+)"), (keys::ID, r"#(\w+)")],
                markers,
            );
            assert!(matches!(duplicate, Err(TaskLineError::DuplicateKey(k)) if k == "id"));
        }

        #[test]
        fn invalid_pattern_names_the_field() {
            let err = Dialect::from_table(
                "x",
                PatternStyle::Symbol,
                [(keys::DUE_DATE, r"due(")],
                Dialect::symbol().markers().clone(),
            )
            .unwrap_err();
            assert!(err.to_string().contains("dueDate"));
        }

        #[test]
        fn capturing_checks_group_range() {
            let p = FieldPattern::symbol(r"🍅 (\d+)").unwrap();
            let err = FieldDefinition::capturing("pomodoros", p, 2).unwrap_err();
            assert!(matches!(
                err,
                TaskLineError::GroupOutOfRange { group: 2, available: 1, .. }
            ));
        }

        #[test]
        fn priority_markers_per_level() {
            let markers = Dialect::inline_field().markers().clone();
            assert_eq!(markers.priority.marker(Priority::Low), "priority:: low");
            assert_eq!(markers.priority.marker(Priority::None), "");
            assert_eq!(markers.date(DateField::Done), "completion::");
        }
    }
}

pub mod extract {
    //! Fixed-point field extraction.
    //!
    //! Each round tries every field once against the trailing edge of the body and cuts
    //! what matches, so tokens written in any order come off right to left. When a round
    //! removes nothing, one sweep picks still-missing fields out of the prose. The loop
    //! stops at the first round that changes nothing, or at [`MAX_ROUNDS`].

    use crate::dialect::FieldDefinition;
    use indexmap::{IndexMap, IndexSet};
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::ops::Range;
    use tracing::{debug, warn};

    /// Upper bound on extraction rounds for one body.
    pub const MAX_ROUNDS: usize = 20;

    const TAG_BODY: &str =
        r##"[^\s\x{2000}-\x{206F}\x{2E00}-\x{2E7F}'!"#$%&()*+,.:;<=>?@^`{|}~\[\]\\]+"##;

    static TRAILING_TAG: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(r"(?:^|\s)(#{TAG_BODY})$"))
            .unwrap_or_else(|e| panic!("invalid trailing tag regex: {e}"))
    });

    static ANY_TAG: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(r"(?:^|\s)(#{TAG_BODY})"))
            .unwrap_or_else(|e| panic!("invalid tag regex: {e}"))
    });

    /// Hashtags are lifted off the trailing edge like other fields, then put back.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TagCollector;

    impl TagCollector {
        /// Remove one trailing tag token from `body` and return it.
        pub fn take_trailing(&self, body: &mut String) -> Option<String> {
            let (start, tag) = {
                let caps = TRAILING_TAG.captures(body.as_str())?;
                let whole = caps.get(0)?;
                (whole.start(), caps.get(1)?.as_str().to_string())
            };
            body.truncate(start);
            trim_in_place(body);
            Some(tag)
        }

        /// Every tag in `text`, deduplicated, in first-seen order.
        pub fn collect(&self, text: &str) -> IndexSet<String> {
            ANY_TAG
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect()
        }
    }

    /// Result of one extraction.
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct Extraction {
        /// Extracted values by field key, in the order they were first found.
        pub fields: IndexMap<String, Option<String>>,
        /// Remaining text, with lifted tags appended back.
        pub body: String,
        pub rounds: usize,
        /// False when [`MAX_ROUNDS`] was reached while rounds were still changing the body.
        pub converged: bool,
    }

    pub struct FieldExtractor<'a> {
        fields: Vec<&'a FieldDefinition>,
        tags: Option<TagCollector>,
    }

    impl<'a> FieldExtractor<'a> {
        /// Fields are tried in iteration order within each round.
        pub fn new(fields: impl IntoIterator<Item = &'a FieldDefinition>) -> Self {
            Self {
                fields: fields.into_iter().collect(),
                tags: None,
            }
        }

        /// Also lift trailing tags, after the fields in every round.
        pub fn with_tags(mut self, tags: TagCollector) -> Self {
            self.tags = Some(tags);
            self
        }

        pub fn extract(&self, body: &str) -> Extraction {
            let mut body = body.trim().to_string();
            let mut fields = IndexMap::new();
            let mut lifted_tags: Vec<String> = Vec::new();
            let mut rounds = 0;
            let mut converged = false;

            while rounds < MAX_ROUNDS {
                rounds += 1;
                let mut changed = self.trailing_round(&mut body, &mut fields, &mut lifted_tags);
                if !changed {
                    changed = self.embedded_sweep(&mut body, &mut fields);
                }
                if !changed {
                    converged = true;
                    break;
                }
            }

            if !converged {
                warn!(
                    rounds,
                    remaining = %body,
                    "field extraction hit the round limit; keeping partial result"
                );
            }

            if !lifted_tags.is_empty() {
                if !body.is_empty() {
                    body.push(' ');
                }
                body.push_str(&lifted_tags.join(" "));
            }

            Extraction {
                fields,
                body,
                rounds,
                converged,
            }
        }

        fn trailing_round(
            &self,
            body: &mut String,
            fields: &mut IndexMap<String, Option<String>>,
            lifted_tags: &mut Vec<String>,
        ) -> bool {
            let mut changed = false;
            for field in &self.fields {
                let Some((span, value)) = field
                    .pattern()
                    .find_trailing(body.as_str())
                    .map(|caps| (caps.span(), field.value(&caps)))
                else {
                    continue;
                };
                debug!(key = field.key(), token = &body[span.clone()], "trailing field");
                body.replace_range(span, "");
                trim_in_place(body);
                fields.insert(field.key().to_string(), value);
                changed = true;
            }
            if let Some(collector) = self.tags {
                // Every tag at the right edge goes in one round; only fields cost rounds.
                let mut lifted = Vec::new();
                while let Some(tag) = collector.take_trailing(body) {
                    debug!(tag = %tag, "lifted trailing tag");
                    lifted.push(tag);
                }
                if !lifted.is_empty() {
                    // Taken right to left; the buffer stays in reading order.
                    lifted.reverse();
                    lifted_tags.splice(0..0, lifted);
                    changed = true;
                }
            }
            changed
        }

        fn embedded_sweep(
            &self,
            body: &mut String,
            fields: &mut IndexMap<String, Option<String>>,
        ) -> bool {
            let mut changed = false;
            for field in &self.fields {
                if fields.contains_key(field.key()) {
                    continue;
                }
                let Some((span, value)) = field
                    .pattern()
                    .find_embedded(body.as_str())
                    .map(|caps| (caps.span(), field.value(&caps)))
                else {
                    continue;
                };
                debug!(key = field.key(), token = &body[span.clone()], "embedded field");
                cut(body, span);
                fields.insert(field.key().to_string(), value);
                changed = true;
            }
            changed
        }
    }

    /// Remove `span` and join the two sides as written; if both sides of the cut
    /// are whitespace, the right side's whitespace is dropped.
    fn cut(body: &mut String, span: Range<usize>) {
        let left = &body[..span.start];
        let mut right = &body[span.end..];
        if left.ends_with(char::is_whitespace) && right.starts_with(char::is_whitespace) {
            right = right.trim_start();
        }
        let joined = format!("{left}{right}");
        *body = joined.trim().to_string();
    }

    fn trim_in_place(s: &mut String) {
        let trimmed = s.trim();
        if trimmed.len() != s.len() {
            *s = trimmed.to_string();
        }
    }

}

pub mod parser {
    //! Line matching and record assembly.
    //!
    //! - The line prefix (indentation, list marker, checkbox) is parsed with `nom`.
    //! - A trailing `^anchor` is split off before fields are looked at.
    //! - The body goes through [`FieldExtractor`] with the dialect fields, the caller's
    //!   extensions and the tag collector.

    use crate::core::{DateField, Priority, TaskComponents, TaskDetails, TaskLineError, keys};
    use crate::dialect::{Dialect, FieldDefinition};
    use crate::extract::{Extraction, FieldExtractor, TagCollector};
    use indexmap::IndexMap;
    use nom::{
        IResult,
        branch::alt,
        bytes::complete::take_while,
        character::complete::{anychar, char, digit1, one_of, space1},
        combinator::recognize,
        error::VerboseError,
        sequence::{delimited, pair, preceded, tuple},
    };
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::collections::HashSet;

    type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

    static BLOCK_LINK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\s(\^[A-Za-z0-9-]+)$")
            .unwrap_or_else(|e| panic!("invalid block link regex: {e}"))
    });

    /* ----------------------------- Line prefix ----------------------------- */

    fn indentation(i: &str) -> PResult<'_, &str> {
        take_while(|c: char| c.is_whitespace() || c == '>')(i)
    }

    fn list_marker(i: &str) -> PResult<'_, &str> {
        alt((recognize(one_of("-*+")), recognize(pair(digit1, char('.')))))(i)
    }

    fn checkbox(i: &str) -> PResult<'_, char> {
        delimited(char('['), anychar, char(']'))(i)
    }

    fn task_prefix(i: &str) -> PResult<'_, (&str, &str, char)> {
        tuple((indentation, list_marker, preceded(space1, checkbox)))(i)
    }

    /// Split a markdown task line into its skeleton; `None` when the line is not a task.
    pub fn match_task_line(line: &str) -> Option<TaskComponents> {
        let (rest, (indentation, list_marker, status)) = task_prefix(line).ok()?;
        let body = rest.trim();
        let (body, block_link) = match BLOCK_LINK.captures(body) {
            Some(caps) => {
                let start = caps.get(0).map_or(body.len(), |m| m.start());
                let link = caps.get(1).map_or("", |m| m.as_str());
                (body[..start].trim_end(), link)
            }
            None => (body, ""),
        };
        Some(TaskComponents {
            indentation: indentation.to_string(),
            list_marker: list_marker.to_string(),
            status: status.to_string(),
            body: body.to_string(),
            block_link: block_link.to_string(),
        })
    }

    /* ---------------------------- Deserializer ---------------------------- */

    /// Turns task lines into [`TaskDetails`] under one dialect plus optional extensions.
    /// Immutable once built; share it freely across threads.
    #[derive(Debug, Clone, Default)]
    pub struct TaskDeserializer {
        dialect: Dialect,
        extensions: Vec<FieldDefinition>,
    }

    impl TaskDeserializer {
        /// Extension keys must be unique and may not shadow a built-in key.
        pub fn new(
            dialect: Dialect,
            extensions: Vec<FieldDefinition>,
        ) -> Result<Self, TaskLineError> {
            let mut seen = HashSet::new();
            for ext in &extensions {
                if keys::is_builtin(ext.key()) {
                    return Err(TaskLineError::ReservedKey(ext.key().to_string()));
                }
                if !seen.insert(ext.key()) {
                    return Err(TaskLineError::DuplicateKey(ext.key().to_string()));
                }
            }
            Ok(Self {
                dialect,
                extensions,
            })
        }

        pub fn dialect(&self) -> &Dialect {
            &self.dialect
        }

        pub fn extensions(&self) -> &[FieldDefinition] {
            &self.extensions
        }

        pub fn deserialize(&self, line: &str) -> Option<TaskDetails> {
            let components = match_task_line(line)?;
            let extraction =
                FieldExtractor::new(self.dialect.fields().iter().chain(&self.extensions))
                    .with_tags(TagCollector)
                    .extract(&components.body);
            Some(assemble(components, extraction))
        }
    }

    fn take(fields: &mut IndexMap<String, Option<String>>, key: &str) -> Option<String> {
        fields.shift_remove(key).flatten()
    }

    fn split_ids(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn assemble(components: TaskComponents, extraction: Extraction) -> TaskDetails {
        let Extraction {
            mut fields, body, ..
        } = extraction;

        let priority = take(&mut fields, keys::PRIORITY)
            .map(|token| Priority::from_token(&token))
            .unwrap_or_default();
        let [start_date, created_date, scheduled_date, due_date, done_date, cancelled_date] =
            DateField::ALL.map(|field| take(&mut fields, field.key()));
        let recurrence_rule = take(&mut fields, keys::RECURRENCE).unwrap_or_default();
        let id = take(&mut fields, keys::ID).unwrap_or_default();
        let blocked_by = take(&mut fields, keys::BLOCKED_BY)
            .map(|raw| split_ids(&raw))
            .unwrap_or_default();
        let tags = TagCollector.collect(&body);

        TaskDetails {
            description: body,
            priority,
            start_date,
            created_date,
            scheduled_date,
            due_date,
            done_date,
            cancelled_date,
            recurrence_rule,
            id,
            blocked_by,
            tags,
            block_link: components.block_link,
            indentation: components.indentation,
            list_marker: components.list_marker,
            status: components.status,
            // Whatever is left was produced by extensions.
            extensions: fields,
        }
    }

}

pub mod format {
    //! Rendering a [`TaskDetails`] back into a task line.

    use crate::core::{DateField, Priority, TaskDetails};
    use crate::dialect::{Dialect, Markers, TokenStyle};

    /// Date fields in the order they are written.
    const DATE_LAYOUT: [DateField; 6] = [
        DateField::Created,
        DateField::Start,
        DateField::Scheduled,
        DateField::Due,
        DateField::Cancelled,
        DateField::Done,
    ];

    /// Render `task` with `dialect`'s markers.
    ///
    /// Layout: skeleton, description, id, blocked-by, priority, recurrence, then dates
    /// (created, start, scheduled, due, cancelled, done) and the block anchor.
    /// Extension values are not written; their syntax belongs to the caller.
    pub fn format_task(task: &TaskDetails, dialect: &Dialect) -> String {
        let markers = dialect.markers();
        let mut parts: Vec<String> = Vec::new();

        if !task.description.is_empty() {
            parts.push(task.description.clone());
        }
        if !task.id.is_empty() {
            parts.push(field(markers, &markers.id, &task.id));
        }
        if !task.blocked_by.is_empty() {
            parts.push(field(markers, &markers.blocked_by, &task.blocked_by.join(",")));
        }
        if task.priority != Priority::None {
            let marker = markers.priority.marker(task.priority);
            if !marker.is_empty() {
                parts.push(wrap(markers.style, marker));
            }
        }
        if !task.recurrence_rule.is_empty() {
            parts.push(field(markers, &markers.recurrence, &task.recurrence_rule));
        }
        for date in DATE_LAYOUT {
            if let Some(value) = task.date(date) {
                parts.push(field(markers, markers.date(date), value));
            }
        }

        let mut line = format!("{}{} [{}]", task.indentation, task.list_marker, task.status);
        if !parts.is_empty() {
            line.push(' ');
            line.push_str(&parts.join(" "));
        }
        if !task.block_link.is_empty() {
            line.push(' ');
            line.push_str(&task.block_link);
        }
        line
    }

    fn field(markers: &Markers, marker: &str, value: &str) -> String {
        wrap(markers.style, &format!("{marker} {value}"))
    }

    fn wrap(style: TokenStyle, token: &str) -> String {
        match style {
            TokenStyle::Bare => token.to_string(),
            TokenStyle::Bracketed => format!("[{token}]"),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::parser::TaskDeserializer;

        #[test]
        fn canonical_lines_round_trip() {
            let deserializer = TaskDeserializer::default();
            for line in [
                "- [x] Hello Obsidian ➕ 2024-01-25 ⏳ 2024-02-08",
                "- [ ] Task 🆔 abc ⛔ def,ghi 🔼 🔁 every week ➕ 2024-01-01 📅 2024-02-01 ^blk",
                "    * [/] Nested #work #deep 🛫 2024-03-01 ✅ 2024-03-02",
                "3. [ ] Bare",
            ] {
                let task = deserializer.deserialize(line).unwrap();
                assert_eq!(format_task(&task, deserializer.dialect()), line);
            }
        }

        #[test]
        fn converts_between_dialects() {
            let symbol = TaskDeserializer::default();
            let task = symbol
                .deserialize("- [ ] Task #home ⏫ 🔁 every day 📅 2024-02-01")
                .unwrap();
            let inline = Dialect::inline_field();
            let rendered = format_task(&task, &inline);
            assert_eq!(
                rendered,
                "- [ ] Task #home [priority:: high] [repeat:: every day] [due:: 2024-02-01]"
            );

            let back = TaskDeserializer::new(inline, vec![])
                .unwrap()
                .deserialize(&rendered)
                .unwrap();
            assert_eq!(back, task);
        }

        #[test]
        fn empty_description_and_no_fields() {
            let task = TaskDeserializer::default().deserialize("- [ ]").unwrap();
            assert_eq!(format_task(&task, &Dialect::symbol()), "- [ ]");
        }

        #[test]
        fn extensions_are_not_rendered() {
            let mut task = TaskDeserializer::default()
                .deserialize("- [ ] Focus 📅 2024-03-01")
                .unwrap();
            task.extensions.insert("pomodoros".into(), Some("4".into()));
            assert_eq!(
                format_task(&task, &Dialect::symbol()),
                "- [ ] Focus 📅 2024-03-01"
            );
        }
    }
}

pub mod config {
    //! JSON configuration: which dialect to use and which extension fields to register.
    //!
    //! ```json
    //! { "dialect": "inline-field",
    //!   "extensions": [ { "key": "pomodoros", "pattern": "🍅:: *(\\d+)" } ] }
    //! ```

    use crate::core::TaskLineError;
    use crate::dialect::{Dialect, FieldDefinition, FieldPattern, Markers, PatternStyle};
    use crate::parser::TaskDeserializer;
    use anyhow::{Context, Result};
    use indexmap::IndexMap;
    use serde::{Deserialize, Serialize};
    use std::{fs, path::Path};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ParseSettings {
        #[serde(default)]
        pub dialect: DialectChoice,
        #[serde(default)]
        pub extensions: Vec<ExtensionSpec>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum DialectChoice {
        #[default]
        Symbol,
        InlineField,
        Custom(DialectSpec),
    }

    /// A replacement marker table.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct DialectSpec {
        pub name: String,
        #[serde(default)]
        pub style: PatternStyle,
        /// Built-in key → inner pattern whose group 1 is the value. Tried in this order.
        pub fields: IndexMap<String, String>,
        pub markers: Markers,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ExtensionSpec {
        pub key: String,
        pub pattern: String,
        #[serde(default)]
        pub style: PatternStyle,
        #[serde(default = "ExtensionSpec::default_group")]
        pub group: usize,
    }

    impl ExtensionSpec {
        fn default_group() -> usize {
            1
        }

        pub fn to_definition(&self) -> Result<FieldDefinition, TaskLineError> {
            let pattern = FieldPattern::compile(self.style, &self.pattern).map_err(|source| {
                TaskLineError::InvalidPattern {
                    key: self.key.clone(),
                    source,
                }
            })?;
            FieldDefinition::capturing(self.key.clone(), pattern, self.group)
        }
    }

    impl DialectSpec {
        pub fn to_dialect(&self) -> Result<Dialect, TaskLineError> {
            Dialect::from_table(
                self.name.clone(),
                self.style,
                self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                self.markers.clone(),
            )
        }
    }

    impl DialectChoice {
        pub fn to_dialect(&self) -> Result<Dialect, TaskLineError> {
            match self {
                Self::Symbol => Ok(Dialect::symbol()),
                Self::InlineField => Ok(Dialect::inline_field()),
                Self::Custom(custom) => custom.to_dialect(),
            }
        }
    }

    impl ParseSettings {
        pub fn load(path: &Path) -> Result<Self> {
            let text =
                fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
            Self::from_json(&text).with_context(|| format!("parsing settings {:?}", path))
        }

        pub fn from_json(text: &str) -> serde_json::Result<Self> {
            serde_json::from_str(text)
        }

        pub fn build(&self) -> Result<TaskDeserializer, TaskLineError> {
            let extensions = self
                .extensions
                .iter()
                .map(ExtensionSpec::to_definition)
                .collect::<Result<Vec<_>, _>>()?;
            TaskDeserializer::new(self.dialect.to_dialect()?, extensions)
        }
    }

}

pub use crate::core::{DateField, Priority, TaskComponents, TaskDetails, TaskLineError};
pub use dialect::{Dialect, FieldDefinition, FieldPattern};
pub use format::format_task;
pub use parser::{TaskDeserializer, match_task_line};
