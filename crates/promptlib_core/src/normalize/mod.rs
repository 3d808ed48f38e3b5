//! State normalization and reconciliation.
//!
//! # Responsibility
//! - Repair any persisted blob (malformed, partial or legacy-shaped) into
//!   canonical `LibraryState`.
//! - Report whether any repair was applied so callers can skip redundant
//!   writes.
//!
//! # Invariants
//! - Output always satisfies the canonical invariants: unique ids, leading
//!   `general` list, dense list order, resolvable references.
//! - Normalizing canonical output again is a fixpoint with `changed=false`.
//! - Duplicate ids are resolved first-occurrence-wins.

pub mod shape;

use crate::clock::now_timestamp;
use crate::model::list::{ListId, PromptList};
use crate::model::prompt::Prompt;
use crate::model::state::{LibraryState, Settings};
use crate::model::{GENERAL_LIST_ID, GENERAL_LIST_NAME, SCHEMA_VERSION};
use log::debug;
use serde_json::Value;
use shape::{
    read_integer, read_text, Coerced, RawShape, CREATED_AT, LIST_NAME, LIST_ORDER,
    PROMPT_BODY, PROMPT_LIST_ID, PROMPT_TITLE, RECORD_ID, UPDATED_AT,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// Counts of repairs applied during one normalization pass, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repairs {
    counts: BTreeMap<&'static str, usize>,
}

impl Repairs {
    fn record(&mut self, kind: &'static str) {
        *self.counts.entry(kind).or_default() += 1;
    }

    fn record_if(&mut self, condition: bool, kind: &'static str) {
        if condition {
            self.record(kind);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of repairs of one kind.
    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }
}

impl Display for Repairs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.counts.is_empty() {
            return write!(f, "none");
        }
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(kind, count)| format!("{kind}:{count}"))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Normalizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub state: LibraryState,
    /// `true` when any repair was applied.
    pub changed: bool,
    pub repairs: Repairs,
}

/// Normalizes `raw`, stamping synthesized timestamps with the current time.
pub fn normalize(raw: &Value) -> Normalized {
    normalize_at(raw, now_timestamp().as_str())
}

/// Normalizes `raw`, using `now` for every timestamp that must be defaulted.
pub fn normalize_at(raw: &Value, now: &str) -> Normalized {
    let mut repairs = Repairs::default();
    repairs.record_if(!raw.is_object(), "input_not_object");

    let shape = RawShape::detect(raw);
    repairs.record_if(shape.is_legacy(), "legacy_shape");

    let mut lists = collect_lists(&shape, now, &mut repairs);
    let remap = resolve_general_list(&mut lists, now, &mut repairs);
    for (index, list) in lists.iter_mut().enumerate() {
        let position = index as i64;
        if list.order != position {
            repairs.record("list_order_resequenced");
            list.order = position;
        }
    }

    let list_ids: HashSet<&str> = lists.iter().map(|list| list.id.as_str()).collect();
    let prompts = collect_prompts(&shape, &list_ids, &remap, now, &mut repairs);
    let settings = resolve_settings(&shape, &lists, &list_ids, &remap, &mut repairs);

    let changed = !repairs.is_empty();
    if changed {
        debug!(
            "event=state_normalize module=normalize status=ok changed=true lists={} prompts={} repairs={}",
            lists.len(),
            prompts.len(),
            repairs
        );
    }

    Normalized {
        state: LibraryState {
            lists,
            prompts,
            settings,
        },
        changed,
        repairs,
    }
}

fn collect_lists(shape: &RawShape<'_>, now: &str, repairs: &mut Repairs) -> Vec<PromptList> {
    let Some(raw_lists) = shape.lists() else {
        repairs.record("lists_missing");
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut lists = Vec::with_capacity(raw_lists.len());
    for (index, entry) in raw_lists.iter().enumerate() {
        let Some(id) = non_empty(read_text(&RECORD_ID, entry), repairs) else {
            repairs.record("list_dropped_missing_id");
            continue;
        };
        let Some(name) = non_empty(read_text(&LIST_NAME, entry), repairs) else {
            repairs.record("list_dropped_missing_name");
            continue;
        };
        if seen.contains(id.as_str()) {
            repairs.record("list_dropped_duplicate_id");
            continue;
        }

        let (created_at, updated_at) = read_timestamps(entry, now, repairs);
        let order = match read_integer(&LIST_ORDER, entry) {
            Some(order) => accept(order, repairs),
            None => {
                repairs.record("list_order_defaulted");
                index as i64
            }
        };

        seen.insert(id.clone());
        lists.push(PromptList {
            id,
            name,
            created_at,
            updated_at,
            order,
        });
    }
    lists
}

/// Moves (or synthesizes) the general list to the front.
///
/// Returns the id remapping applied when the general list was found by name.
fn resolve_general_list(
    lists: &mut Vec<PromptList>,
    now: &str,
    repairs: &mut Repairs,
) -> HashMap<ListId, ListId> {
    let mut remap = HashMap::new();

    let by_id = lists.iter().position(|list| list.id == GENERAL_LIST_ID);
    let found = by_id.or_else(|| lists.iter().position(|list| list.has_name(GENERAL_LIST_NAME)));

    let Some(index) = found else {
        repairs.record("general_list_synthesized");
        lists.insert(0, PromptList::new(GENERAL_LIST_ID, GENERAL_LIST_NAME, now, 0));
        return remap;
    };

    let mut general = lists.remove(index);
    if general.id != GENERAL_LIST_ID {
        repairs.record("general_list_id_remapped");
        remap.insert(general.id.clone(), GENERAL_LIST_ID.to_string());
        general.id = GENERAL_LIST_ID.to_string();
    }
    if general.name != GENERAL_LIST_NAME {
        repairs.record("general_list_renamed");
        general.name = GENERAL_LIST_NAME.to_string();
    }
    repairs.record_if(index > 0, "general_list_relocated");
    lists.insert(0, general);
    remap
}

fn collect_prompts(
    shape: &RawShape<'_>,
    list_ids: &HashSet<&str>,
    remap: &HashMap<ListId, ListId>,
    now: &str,
    repairs: &mut Repairs,
) -> Vec<Prompt> {
    let Some(raw_prompts) = shape.prompts() else {
        repairs.record("prompts_missing");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut prompts = Vec::with_capacity(raw_prompts.len());
    for entry in raw_prompts {
        let Some(id) = non_empty(read_text(&RECORD_ID, entry), repairs) else {
            repairs.record("prompt_dropped_missing_id");
            continue;
        };
        // An entry claims its id even when it is dropped for an empty body.
        if !seen.insert(id.clone()) {
            repairs.record("prompt_dropped_duplicate_id");
            continue;
        }

        let list_id = resolve_list_reference(
            read_text(&PROMPT_LIST_ID, entry),
            list_ids,
            remap,
            repairs,
        );

        let title = match read_text(&PROMPT_TITLE, entry) {
            Some(title) => accept(title, repairs),
            None => {
                repairs.record("prompt_title_defaulted");
                String::new()
            }
        };
        let Some(body) = non_empty(read_text(&PROMPT_BODY, entry), repairs) else {
            repairs.record("prompt_dropped_empty_body");
            continue;
        };

        let (created_at, updated_at) = read_timestamps(entry, now, repairs);
        prompts.push(Prompt {
            id,
            list_id,
            title,
            body,
            created_at,
            updated_at,
        });
    }
    prompts
}

fn resolve_list_reference(
    raw: Option<Coerced<String>>,
    list_ids: &HashSet<&str>,
    remap: &HashMap<ListId, ListId>,
    repairs: &mut Repairs,
) -> ListId {
    let mut list_id = raw.map(|value| accept(value, repairs)).unwrap_or_default();
    if let Some(mapped) = remap.get(list_id.as_str()) {
        repairs.record("reference_remapped");
        list_id = mapped.clone();
    }
    if list_id.is_empty() || !list_ids.contains(list_id.as_str()) {
        repairs.record("reference_reassigned");
        list_id = GENERAL_LIST_ID.to_string();
    }
    list_id
}

fn resolve_settings(
    shape: &RawShape<'_>,
    lists: &[PromptList],
    list_ids: &HashSet<&str>,
    remap: &HashMap<ListId, ListId>,
    repairs: &mut Repairs,
) -> Settings {
    let mut active_list_id = shape
        .active_list_id()
        .map(|value| accept(value, repairs))
        .unwrap_or_default();
    if let Some(mapped) = remap.get(active_list_id.as_str()) {
        repairs.record("active_list_remapped");
        active_list_id = mapped.clone();
    }
    if active_list_id.is_empty() || !list_ids.contains(active_list_id.as_str()) {
        repairs.record("active_list_defaulted");
        active_list_id = lists
            .first()
            .map_or_else(|| GENERAL_LIST_ID.to_string(), |list| list.id.clone());
    }

    let version_matches = matches!(
        shape.schema_version(),
        Some(Coerced { value, repaired: false }) if value == SCHEMA_VERSION
    );
    repairs.record_if(!version_matches, "schema_version_stamped");

    Settings {
        active_list_id,
        schema_version: SCHEMA_VERSION,
    }
}

fn read_timestamps(entry: &Value, now: &str, repairs: &mut Repairs) -> (String, String) {
    let created_at = match non_empty(read_text(&CREATED_AT, entry), repairs) {
        Some(value) => value,
        None => {
            repairs.record("timestamp_defaulted");
            now.to_string()
        }
    };
    let updated_at = match non_empty(read_text(&UPDATED_AT, entry), repairs) {
        Some(value) => value,
        None => {
            repairs.record("timestamp_defaulted");
            created_at.clone()
        }
    };
    (created_at, updated_at)
}

fn accept<T>(coerced: Coerced<T>, repairs: &mut Repairs) -> T {
    repairs.record_if(coerced.repaired, "field_coerced");
    coerced.value
}

fn non_empty(coerced: Option<Coerced<String>>, repairs: &mut Repairs) -> Option<String> {
    coerced
        .map(|value| accept(value, repairs))
        .filter(|value| !value.is_empty())
}
