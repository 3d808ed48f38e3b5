//! Decoding of raw persisted blobs into recognized input shapes.
//!
//! # Responsibility
//! - Classify an arbitrary JSON blob as `Modern` or `Legacy`.
//! - Map every known field spelling through one alias table.
//! - Coerce loosely typed scalars (stringified numbers, padded strings).
//!
//! # Invariants
//! - `Legacy` is chosen only when no `settings` object is present and a
//!   top-level active-list id exists.
//! - The canonical spelling of a field always wins over its aliases.
//! - `null` is treated the same as an absent field.

use serde_json::Value;

/// One logical field: its canonical persisted name plus accepted aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

pub const RECORD_ID: FieldSpec = FieldSpec {
    canonical: "id",
    aliases: &[],
};
pub const LIST_NAME: FieldSpec = FieldSpec {
    canonical: "name",
    aliases: &["nombre"],
};
pub const LIST_ORDER: FieldSpec = FieldSpec {
    canonical: "order",
    aliases: &["orden"],
};
pub const CREATED_AT: FieldSpec = FieldSpec {
    canonical: "createdAt",
    aliases: &["creado_en", "created_at"],
};
pub const UPDATED_AT: FieldSpec = FieldSpec {
    canonical: "updatedAt",
    aliases: &["actualizado_en", "updated_at"],
};
pub const PROMPT_LIST_ID: FieldSpec = FieldSpec {
    canonical: "listId",
    aliases: &["lista_id"],
};
pub const PROMPT_TITLE: FieldSpec = FieldSpec {
    canonical: "title",
    aliases: &["titulo"],
};
pub const PROMPT_BODY: FieldSpec = FieldSpec {
    canonical: "body",
    aliases: &["content", "cuerpo"],
};
pub const ACTIVE_LIST_ID: FieldSpec = FieldSpec {
    canonical: "activeListId",
    aliases: &["lista_activa_id"],
};
pub const SCHEMA_VERSION: FieldSpec = FieldSpec {
    canonical: "schemaVersion",
    aliases: &["version"],
};
/// Top-level active id of the legacy single-blob layout.
pub const LEGACY_ACTIVE_LIST_ID: FieldSpec = FieldSpec {
    canonical: "lista_activa_id",
    aliases: &["activeListId"],
};

/// A field lookup result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRead<'a> {
    Missing,
    Canonical(&'a Value),
    Alias(&'a Value),
}

impl FieldSpec {
    /// Looks the field up on `entry`, canonical spelling first.
    pub fn read<'a>(&self, entry: &'a Value) -> FieldRead<'a> {
        if let Some(value) = present(entry, self.canonical) {
            return FieldRead::Canonical(value);
        }
        self.aliases
            .iter()
            .find_map(|alias| present(entry, alias))
            .map_or(FieldRead::Missing, FieldRead::Alias)
    }
}

fn present<'a>(entry: &'a Value, key: &str) -> Option<&'a Value> {
    entry.get(key).filter(|value| !value.is_null())
}

/// A decoded value plus whether decoding had to repair it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coerced<T> {
    pub value: T,
    /// `true` when an alias, a type conversion, or trimming was needed.
    pub repaired: bool,
}

/// Reads a field as trimmed text. Numbers and booleans are stringified.
///
/// Returns `None` for missing fields and for arrays/objects.
pub fn read_text(field: &FieldSpec, entry: &Value) -> Option<Coerced<String>> {
    let (value, via_alias) = match field.read(entry) {
        FieldRead::Missing => return None,
        FieldRead::Canonical(value) => (value, false),
        FieldRead::Alias(value) => (value, true),
    };
    let coerced = coerce_text(value)?;
    Some(Coerced {
        value: coerced.value,
        repaired: via_alias || coerced.repaired,
    })
}

/// Coerces one scalar to trimmed text.
pub fn coerce_text(value: &Value) -> Option<Coerced<String>> {
    let (text, converted) = match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (trimmed.to_string(), trimmed.len() != raw.len())
        }
        Value::Number(number) => (number.to_string(), true),
        Value::Bool(flag) => (flag.to_string(), true),
        _ => return None,
    };
    Some(Coerced {
        value: text,
        repaired: converted,
    })
}

/// Reads a field as an integer. Integral floats and numeric strings are
/// accepted as repairs.
pub fn read_integer(field: &FieldSpec, entry: &Value) -> Option<Coerced<i64>> {
    let (value, via_alias) = match field.read(entry) {
        FieldRead::Missing => return None,
        FieldRead::Canonical(value) => (value, false),
        FieldRead::Alias(value) => (value, true),
    };
    let (number, converted) = match value {
        Value::Number(number) => match number.as_i64() {
            Some(integer) => (integer, false),
            None => {
                let float = number.as_f64()?;
                if !float.is_finite() || float.fract() != 0.0 {
                    return None;
                }
                (float as i64, true)
            }
        },
        Value::String(raw) => (raw.trim().parse::<i64>().ok()?, true),
        _ => return None,
    };
    Some(Coerced {
        value: number,
        repaired: via_alias || converted,
    })
}

/// Recognized top-level layouts of a persisted blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawShape<'a> {
    /// `{lists, prompts, settings}`.
    Modern {
        lists: Option<&'a Value>,
        prompts: Option<&'a Value>,
        settings: Option<&'a Value>,
    },
    /// `{lists, prompts, lista_activa_id | activeListId}`.
    Legacy {
        lists: Option<&'a Value>,
        prompts: Option<&'a Value>,
        active_list_id: &'a Value,
    },
}

impl<'a> RawShape<'a> {
    /// Classifies `raw`. Non-object input decodes as an empty modern shape.
    pub fn detect(raw: &'a Value) -> Self {
        let lists = present(raw, "lists");
        let prompts = present(raw, "prompts");
        let settings = present(raw, "settings").filter(|value| value.is_object());

        if settings.is_none() {
            match LEGACY_ACTIVE_LIST_ID.read(raw) {
                FieldRead::Canonical(active_list_id) | FieldRead::Alias(active_list_id) => {
                    return Self::Legacy {
                        lists,
                        prompts,
                        active_list_id,
                    };
                }
                FieldRead::Missing => {}
            }
        }

        Self::Modern {
            lists,
            prompts,
            settings,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }

    /// Raw list entries; `None` when the field is not an array.
    pub fn lists(&self) -> Option<&'a Vec<Value>> {
        match self {
            Self::Modern { lists, .. } | Self::Legacy { lists, .. } => {
                lists.and_then(Value::as_array)
            }
        }
    }

    /// Raw prompt entries; `None` when the field is not an array.
    pub fn prompts(&self) -> Option<&'a Vec<Value>> {
        match self {
            Self::Modern { prompts, .. } | Self::Legacy { prompts, .. } => {
                prompts.and_then(Value::as_array)
            }
        }
    }

    /// Active list reference as stored. Legacy reads are always repairs.
    pub fn active_list_id(&self) -> Option<Coerced<String>> {
        match self {
            Self::Modern { settings, .. } => {
                settings.and_then(|settings| read_text(&ACTIVE_LIST_ID, settings))
            }
            Self::Legacy { active_list_id, .. } => {
                coerce_text(active_list_id).map(|coerced| Coerced {
                    value: coerced.value,
                    repaired: true,
                })
            }
        }
    }

    /// Stored schema version. The legacy layout never carries one.
    pub fn schema_version(&self) -> Option<Coerced<i64>> {
        match self {
            Self::Modern { settings, .. } => {
                settings.and_then(|settings| read_integer(&SCHEMA_VERSION, settings))
            }
            Self::Legacy { .. } => None,
        }
    }
}
