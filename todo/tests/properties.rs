//! Property tests for the reducer rules and the derived view.

use std::collections::HashSet;
use std::sync::Arc;

use pocket_todo::mocks::{InMemoryStorage, StaticSeedSource};
use pocket_todo::{
    Filter, SortOrder, TodoAction, TodoEnvironment, TodoId, TodoItem, TodoReducer, TodoState,
    compute_view,
};
use pocket_todo_core::reducer::Reducer;
use pocket_todo_testing::{test_clock, test_time};
use proptest::prelude::*;

fn env() -> TodoEnvironment {
    TodoEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(InMemoryStorage::new()),
        Arc::new(StaticSeedSource::empty()),
    )
}

fn apply(state: &mut TodoState, actions: Vec<TodoAction>) {
    let reducer = TodoReducer::new();
    let env = env();
    for action in actions {
        let _ = reducer.reduce(state, action, &env);
    }
}

fn any_title() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[a-zA-Z ]{1,12}",
    ]
}

fn any_action() -> impl Strategy<Value = TodoAction> {
    let id = (1u64..12).prop_map(TodoId::from);
    prop_oneof![
        4 => any_title().prop_map(|title| TodoAction::Add { title }),
        2 => id.clone().prop_map(|id| TodoAction::Toggle { id }),
        1 => (id.clone(), any_title()).prop_map(|(id, title)| TodoAction::Edit { id, title }),
        1 => id.prop_map(|id| TodoAction::Delete { id }),
        1 => Just(TodoAction::ToggleAll),
        1 => Just(TodoAction::ClearCompleted),
    ]
}

fn any_filter() -> impl Strategy<Value = Filter> {
    prop_oneof![Just(Filter::All), Just(Filter::Active), Just(Filter::Completed)]
}

fn any_sort() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Id), Just(SortOrder::Recent)]
}

fn any_todos() -> impl Strategy<Value = Vec<TodoItem>> {
    prop::collection::vec(("[a-z]{1,8}", any::<bool>(), 0i64..100), 0..20).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (title, completed, age))| {
                let id = if i % 5 == 4 {
                    TodoId::from(format!("r{i}").as_str())
                } else {
                    TodoId::from(i as u64 * 7 % 23)
                };
                let mut todo = TodoItem::new(id, title, test_time() - chrono::Duration::minutes(age));
                todo.completed = completed;
                todo
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn ids_stay_unique(actions in prop::collection::vec(any_action(), 0..60)) {
        let mut state = TodoState::new();
        apply(&mut state, actions);

        let ids: HashSet<_> = state.todos.iter().map(|t| t.id.clone()).collect();
        prop_assert_eq!(ids.len(), state.count());
        for todo in &state.todos {
            prop_assert!(todo.id.numeric().unwrap() < state.next_id);
            prop_assert!(!todo.title.trim().is_empty());
            prop_assert!(todo.updated_at >= todo.created_at);
        }
    }

    #[test]
    fn blank_adds_change_nothing(title in "[ \t]{0,6}", actions in prop::collection::vec(any_action(), 0..20)) {
        let mut state = TodoState::new();
        apply(&mut state, actions);
        let before = state.clone();

        apply(&mut state, vec![TodoAction::Add { title }]);
        prop_assert_eq!(state, before);
    }

    #[test]
    fn clear_completed_leaves_only_open(actions in prop::collection::vec(any_action(), 0..40)) {
        let mut state = TodoState::new();
        apply(&mut state, actions);
        let open = state.active_count();

        apply(&mut state, vec![TodoAction::ClearCompleted]);
        prop_assert_eq!(state.completed_count(), 0);
        prop_assert_eq!(state.count(), open);
    }

    #[test]
    fn toggle_all_flips_between_extremes(actions in prop::collection::vec(any_action(), 1..40)) {
        let mut state = TodoState::new();
        apply(&mut state, actions);
        prop_assume!(state.count() > 0);

        let was_all_done = state.all_completed();
        apply(&mut state, vec![TodoAction::ToggleAll]);
        if was_all_done {
            prop_assert_eq!(state.completed_count(), 0);
        } else {
            prop_assert!(state.all_completed());
        }
    }

    #[test]
    fn view_is_pure_and_idempotent(
        todos in any_todos(),
        filter in any_filter(),
        sort in any_sort(),
        search in "[a-z ]{0,3}",
    ) {
        let before = todos.clone();
        let view = compute_view(&todos, filter, &search, sort);

        prop_assert_eq!(&todos, &before);
        prop_assert_eq!(&compute_view(&todos, filter, &search, sort), &view);
        prop_assert_eq!(&compute_view(&view, filter, &search, sort), &view);
    }

    #[test]
    fn active_and_completed_partition_all(todos in any_todos(), sort in any_sort()) {
        let all = compute_view(&todos, Filter::All, "", sort);
        let active = compute_view(&todos, Filter::Active, "", sort);
        let completed = compute_view(&todos, Filter::Completed, "", sort);

        prop_assert_eq!(all.len(), todos.len());
        prop_assert_eq!(active.len() + completed.len(), all.len());
        prop_assert!(active.iter().all(|t| !t.completed));
        prop_assert!(completed.iter().all(|t| t.completed));
    }
}
