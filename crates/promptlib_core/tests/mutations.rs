use promptlib_core::{
    Clock, IdGenerator, LibraryService, MemoryStateStore, ServiceError, StateStore, StoreError,
    StoreResult, ValidationError,
};
use serde_json::{json, Value};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

struct SequentialIds(Cell<u32>);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let next = self.0.get() + 1;
        self.0.set(next);
        format!("id-{next}")
    }
}

/// Ticks one second per call.
struct TickingClock(Cell<u32>);

impl Clock for TickingClock {
    fn now(&self) -> String {
        let tick = self.0.get() + 1;
        self.0.set(tick);
        format!("2026-10-19T08:{:02}:{:02}.000Z", tick / 60, tick % 60)
    }
}

#[derive(Clone, Default)]
struct StoreProbe {
    writes: Rc<Cell<usize>>,
    fail_writes: Rc<Cell<bool>>,
}

struct ProbedStore {
    inner: MemoryStateStore,
    probe: StoreProbe,
}

impl StateStore for ProbedStore {
    fn read(&self, keys: &[&str]) -> StoreResult<BTreeMap<String, Value>> {
        self.inner.read(keys)
    }

    fn write(&mut self, entries: BTreeMap<String, Value>) -> StoreResult<()> {
        if self.probe.fail_writes.get() {
            return Err(StoreError::Unavailable("quota exceeded".to_string()));
        }
        self.probe.writes.set(self.probe.writes.get() + 1);
        self.inner.write(entries)
    }

    fn delete(&mut self, keys: &[&str]) -> StoreResult<()> {
        self.inner.delete(keys)
    }
}

fn library() -> (LibraryService<ProbedStore>, StoreProbe) {
    let probe = StoreProbe::default();
    let store = ProbedStore {
        inner: MemoryStateStore::new(),
        probe: probe.clone(),
    };
    let service = LibraryService::with_sources(
        store,
        SequentialIds(Cell::new(0)),
        TickingClock(Cell::new(0)),
    );
    (service, probe)
}

fn validation(err: ServiceError) -> ValidationError {
    match err {
        ServiceError::Validation(err) => err,
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn list_names_collide_case_insensitively() {
    let (mut library, _) = library();
    library.create_list("Work").unwrap();

    let err = validation(library.create_list("work").unwrap_err());
    assert_eq!(err, ValidationError::DuplicateListName("work".to_string()));

    let err = validation(library.create_list(" GENERAL ").unwrap_err());
    assert_eq!(err, ValidationError::DuplicateListName("GENERAL".to_string()));

    let err = validation(library.create_list("   ").unwrap_err());
    assert_eq!(err, ValidationError::ListNameRequired);
}

#[test]
fn create_prompt_on_fresh_library_targets_general() {
    let (mut library, probe) = library();

    let state = library
        .dispatch("createPrompt", &json!({ "body": "hello" }))
        .unwrap();
    assert_eq!(state.prompts.len(), 1);
    assert_eq!(state.prompts[0].list_id, "general");
    assert_eq!(state.prompts[0].body, "hello");
    assert_eq!(state.prompts[0].title, "");
    assert_eq!(state.lists[0].updated_at, state.prompts[0].created_at);
    // One write repairs the empty store on load, one commits the prompt.
    assert_eq!(probe.writes.get(), 2);
}

#[test]
fn prompts_are_ordered_newest_first() {
    let (mut library, _) = library();

    let first = library.create_prompt("", "first", None).unwrap();
    let first_id = first.prompts[0].id.clone();
    let second = library.create_prompt("", "second", None).unwrap();

    assert_eq!(second.prompts.len(), 2);
    assert_ne!(second.prompts[0].id, first_id);
    assert_eq!(second.prompts[0].body, "second");
    assert_eq!(second.prompts[1].id, first_id);
}

#[test]
fn general_list_can_never_be_deleted() {
    let (mut library, probe) = library();
    let work = library.create_list("Work").unwrap().lists[1].id.clone();
    let writes_before = probe.writes.get();

    for payload in [
        json!({ "listId": "general" }),
        json!({ "listId": " general ", "destinationListId": work }),
        json!({ "listId": "general", "destinationListId": "general" }),
    ] {
        let err = validation(library.dispatch("deleteList", &payload).unwrap_err());
        assert_eq!(err, ValidationError::GeneralListProtected);
    }
    assert_eq!(probe.writes.get(), writes_before);
}

#[test]
fn delete_list_with_destination_moves_prompts_and_active_list() {
    let (mut library, _) = library();
    library.create_list("A").unwrap();
    let state = library.create_list("B").unwrap();
    let list_a = state.lists[1].id.clone();
    let list_b = state.lists[2].id.clone();

    library.set_active_list(list_a.clone()).unwrap();
    library.create_prompt("one", "first body", None).unwrap();
    library.create_prompt("two", "second body", None).unwrap();
    library
        .create_prompt("", "in b", Some(list_b.clone()))
        .unwrap();

    let state = library
        .delete_list(list_a.clone(), Some(list_b.clone()))
        .unwrap();

    assert!(!state.has_list(&list_a));
    assert_eq!(state.settings.active_list_id, list_b);
    assert_eq!(state.prompts.len(), 3);
    assert!(state.prompts.iter().all(|prompt| prompt.list_id == list_b));

    let destination = state.list_by_id(&list_b).unwrap();
    let moved: Vec<_> = state
        .prompts
        .iter()
        .filter(|prompt| prompt.body != "in b")
        .collect();
    assert_eq!(moved.len(), 2);
    for prompt in moved {
        assert_eq!(prompt.updated_at, destination.updated_at);
        assert_ne!(prompt.updated_at, prompt.created_at);
    }
    let untouched = state.prompts.iter().find(|p| p.body == "in b").unwrap();
    assert_eq!(untouched.updated_at, untouched.created_at);

    let orders: Vec<i64> = state.lists.iter().map(|list| list.order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[test]
fn delete_list_without_destination_discards_prompts() {
    let (mut library, _) = library();
    let list_a = library.create_list("A").unwrap().lists[1].id.clone();
    library.set_active_list(list_a.clone()).unwrap();
    library.create_prompt("", "doomed", None).unwrap();
    library
        .create_prompt("", "kept", Some("general".to_string()))
        .unwrap();

    let state = library
        .dispatch(
            "deleteList",
            &json!({ "listId": list_a, "destinationListId": "" }),
        )
        .unwrap();
    assert_eq!(state.lists.len(), 1);
    assert_eq!(state.settings.active_list_id, "general");
    assert_eq!(state.prompts.len(), 1);
    assert_eq!(state.prompts[0].body, "kept");
}

#[test]
fn delete_list_rejects_invalid_destinations() {
    let (mut library, _) = library();
    let list_a = library.create_list("A").unwrap().lists[1].id.clone();

    let err = validation(
        library
            .delete_list(list_a.clone(), Some(list_a.clone()))
            .unwrap_err(),
    );
    assert_eq!(err, ValidationError::DestinationIsSource);

    let err = validation(
        library
            .delete_list(list_a.clone(), Some("nowhere".to_string()))
            .unwrap_err(),
    );
    assert_eq!(err, ValidationError::DestinationNotFound("nowhere".to_string()));

    let err = validation(library.delete_list("nope", None).unwrap_err());
    assert_eq!(err, ValidationError::ListNotFound("nope".to_string()));

    let err = validation(library.delete_list("  ", None).unwrap_err());
    assert_eq!(err, ValidationError::ListIdRequired);
}

#[test]
fn delete_prompt_removes_it_and_bumps_parent_list() {
    let (mut library, _) = library();
    let state = library.create_prompt("t", "body", None).unwrap();
    let prompt_id = state.prompts[0].id.clone();
    let touched_at = state.lists[0].updated_at.clone();

    let state = library.delete_prompt(prompt_id.clone()).unwrap();
    assert!(state.prompts.is_empty());
    assert_ne!(state.lists[0].updated_at, touched_at);

    let err = validation(library.delete_prompt(prompt_id.clone()).unwrap_err());
    assert_eq!(err, ValidationError::PromptNotFound(prompt_id));
    let err = validation(library.dispatch("deletePrompt", &json!({})).unwrap_err());
    assert_eq!(err, ValidationError::PromptIdRequired);
}

#[test]
fn create_prompt_validates_target_and_body() {
    let (mut library, _) = library();

    let err = validation(library.create_prompt("t", "   ", None).unwrap_err());
    assert_eq!(err, ValidationError::PromptBodyRequired);

    let err = validation(
        library
            .create_prompt("t", "body", Some("missing".to_string()))
            .unwrap_err(),
    );
    assert_eq!(err, ValidationError::ListNotFound("missing".to_string()));

    let err = validation(
        library
            .dispatch("createPrompt", &json!({ "body": "b", "listId": "" }))
            .unwrap_err(),
    );
    assert_eq!(err, ValidationError::NoActiveList);

    let err = validation(
        library
            .dispatch("createPrompt", &json!({ "title": "n", "body": 42 }))
            .unwrap_err(),
    );
    assert_eq!(err, ValidationError::PromptBodyRequired);
}

#[test]
fn set_active_list_validates_and_skips_no_op_writes() {
    let (mut library, probe) = library();
    let list_a = library.create_list("A").unwrap().lists[1].id.clone();

    let err = validation(library.set_active_list("").unwrap_err());
    assert_eq!(err, ValidationError::ListIdRequired);
    let err = validation(library.set_active_list("ghost").unwrap_err());
    assert_eq!(err, ValidationError::ListNotFound("ghost".to_string()));

    let state = library.set_active_list(list_a.clone()).unwrap();
    assert_eq!(state.active_list().map(|list| list.name.as_str()), Some("A"));

    let writes = probe.writes.get();
    let again = library.set_active_list(list_a).unwrap();
    assert_eq!(again, state);
    assert_eq!(probe.writes.get(), writes);
}

#[test]
fn failed_write_keeps_cache_and_store_at_previous_state() {
    let (mut library, probe) = library();
    let before = library.create_list("Keep").unwrap();

    probe.fail_writes.set(true);
    let err = library.create_list("Lost").unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));
    assert_eq!(library.get_state().unwrap(), before);
    let stored_lists = library.store().inner.get("lists").unwrap();
    assert_eq!(stored_lists.as_array().unwrap().len(), 2);

    probe.fail_writes.set(false);
    let after = library.create_list("Lost").unwrap();
    assert_eq!(after.lists.len(), 3);
}

#[test]
fn get_state_and_unknown_actions_do_not_write() {
    let (mut library, probe) = library();
    library.dispatch("getState", &Value::Null).unwrap();
    let writes = probe.writes.get();

    let state = library.dispatch("getState", &json!({})).unwrap();
    assert_eq!(state.lists[0].id, "general");
    let err = validation(library.dispatch("renameList", &json!({})).unwrap_err());
    assert_eq!(err, ValidationError::UnsupportedAction("renameList".to_string()));
    assert_eq!(probe.writes.get(), writes);
}
