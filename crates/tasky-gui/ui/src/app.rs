mod reload;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use chrono_tz::Tz;
use gloo::timers::future::TimeoutFuture;
use tasky_core::api::TaskApi;
use tasky_core::board::{
  EditForm,
  Mutation,
  Notice,
  mutate
};
use tasky_core::drag::{
  DragController,
  MoveIntent
};
use tasky_core::query::LaneQuery;
use tasky_core::render::{
  LaneView,
  Renderer
};
use tasky_core::search::filter_tasks;
use tasky_core::store::TaskStore;
use tasky_shared::{
  Lane,
  Task,
  TaskId
};
use wasm_bindgen::JsValue;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  Reducible,
  UseReducerHandle,
  UseStateHandle,
  function_component,
  html,
  use_effect_with,
  use_memo,
  use_mut_ref,
  use_reducer,
  use_state
};

use self::reload::reload_board;
use crate::api::GlooTaskApi;
use crate::components::{
  FilterBar,
  KanbanBoard,
  ModalMode,
  ModalState,
  NoticeBanner,
  SearchResults,
  TaskModal
};

const NOTICE_MS: u32 = 4_000;

/// Bumped after every successful
/// mutation; each bump reloads the board.
#[derive(Default, PartialEq)]
struct ReloadTick(u64);

impl Reducible for ReloadTick {
  type Action = ();

  fn reduce(
    self: Rc<Self>,
    _action: ()
  ) -> Rc<Self> {
    Rc::new(Self(self.0.wrapping_add(1)))
  }
}

/// IANA zone the browser reports, UTC
/// when unknown.
fn browser_timezone() -> Tz {
  let options =
    js_sys::Intl::DateTimeFormat::new(
      &js_sys::Array::new(),
      &js_sys::Object::new()
    )
    .resolved_options();
  js_sys::Reflect::get(
    &options,
    &JsValue::from_str("timeZone")
  )
  .ok()
  .and_then(|zone| zone.as_string())
  .and_then(|zone| zone.parse::<Tz>().ok())
  .unwrap_or(Tz::UTC)
}

fn show_notice(
  notice: &UseStateHandle<Option<Notice>>,
  seq: &Rc<RefCell<u64>>,
  next: Notice
) {
  let current = {
    let mut seq = seq.borrow_mut();
    *seq = seq.wrapping_add(1);
    *seq
  };
  notice.set(Some(next));

  let notice = notice.clone();
  let seq = seq.clone();
  wasm_bindgen_futures::spawn_local(
    async move {
      TimeoutFuture::new(NOTICE_MS).await;
      if *seq.borrow() == current {
        notice.set(None);
      }
    }
  );
}

/// Sends `mutation`, shows its notice and
/// bumps the reload tick on success.
async fn run_mutation(
  api: &GlooTaskApi,
  mutation: Mutation,
  notice: &UseStateHandle<Option<Notice>>,
  seq: &Rc<RefCell<u64>>,
  tick: &UseReducerHandle<ReloadTick>
) -> Notice {
  let outcome = mutate(api, &mutation).await;
  if outcome.is_success() {
    tick.dispatch(());
  }
  show_notice(notice, seq, outcome.clone());
  outcome
}

#[derive(Properties, PartialEq)]
pub struct AppProps {
  pub api: GlooTaskApi
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
  let renderer = use_memo((), |_| {
    Renderer::new(browser_timezone())
  });
  let store = use_mut_ref(TaskStore::new);
  let lanes = use_state(Vec::<LaneView>::new);
  let all_tasks = use_state(Vec::<Task>::new);
  let query = use_state(LaneQuery::default);
  let search = use_state(String::new);
  let collapsed =
    use_state(BTreeSet::<Lane>::new);
  let drag = use_state(DragController::new);
  let notice = use_state(|| None::<Notice>);
  let notice_seq = use_mut_ref(|| 0_u64);
  let modal_state =
    use_state(|| None::<ModalState>);
  let modal_busy = use_state(|| false);
  let filters_open = use_state(|| true);
  let tick = use_reducer(ReloadTick::default);

  {
    let api = props.api.clone();
    let store = store.clone();
    let lanes = lanes.clone();
    let all_tasks = all_tasks.clone();
    let renderer = renderer.clone();

    use_effect_with(
      ((*query).clone(), tick.0),
      move |(query, tick)| {
        let query = query.clone();
        let tick = *tick;
        wasm_bindgen_futures::spawn_local(async move {
          tracing::info!(tick, query = %query.to_query_string(), "reloading board");
          if let Some(loaded) = reload_board(&api, &store, &query, &renderer).await {
            lanes.set(loaded.lanes);
            all_tasks.set(loaded.all_tasks);
          }
        });
        || ()
      }
    );
  }

  let on_commit = {
    let api = props.api.clone();
    let notice = notice.clone();
    let notice_seq = notice_seq.clone();
    let tick = tick.clone();
    Callback::from(move |intent: MoveIntent| {
      let api = api.clone();
      let notice = notice.clone();
      let notice_seq = notice_seq.clone();
      let tick = tick.clone();
      wasm_bindgen_futures::spawn_local(async move {
        run_mutation(&api, Mutation::Move(intent), &notice, &notice_seq, &tick).await;
      });
    })
  };

  let on_drag_start = {
    let drag = drag.clone();
    Callback::from(move |id: TaskId| {
      let mut next = (*drag).clone();
      next.drag_start(id);
      drag.set(next);
    })
  };

  let on_drag_over_lane = {
    let drag = drag.clone();
    Callback::from(move |lane: Lane| {
      if drag.over_lane() == Some(lane) {
        return;
      }
      let mut next = (*drag).clone();
      next.drag_over(lane);
      drag.set(next);
    })
  };

  let on_drag_end = {
    let drag = drag.clone();
    Callback::from(move |()| {
      let mut next = (*drag).clone();
      next.drag_end();
      drag.set(next);
    })
  };

  let on_drop = {
    let drag = drag.clone();
    let on_commit = on_commit.clone();
    Callback::from(
      move |(lane, payload): (Lane, String)| {
        let mut next = (*drag).clone();
        let intent = next.drop_on(lane, &payload);
        drag.set(next);
        if let Some(intent) = intent {
          on_commit.emit(intent);
        }
      }
    )
  };

  let on_move = {
    let on_commit = on_commit.clone();
    Callback::from(
      move |(task_id, lane): (TaskId, Lane)| {
        on_commit.emit(MoveIntent::to_lane(
          task_id, lane
        ));
      }
    )
  };

  let on_edit = {
    let api = props.api.clone();
    let renderer = renderer.clone();
    let modal_state = modal_state.clone();
    let notice = notice.clone();
    let notice_seq = notice_seq.clone();
    Callback::from(move |id: TaskId| {
      let api = api.clone();
      let zone = renderer.timezone();
      let modal_state = modal_state.clone();
      let notice = notice.clone();
      let notice_seq = notice_seq.clone();
      wasm_bindgen_futures::spawn_local(async move {
        match api.get_one(id).await {
          | Ok(task) => {
            modal_state.set(Some(ModalState::edit(EditForm::in_zone(&task, zone))))
          }
          | Err(err) => {
            tracing::error!(task_id = id, error = %err, "loading task for edit failed");
            show_notice(&notice, &notice_seq, Notice::Failure(err.banner_text()));
          }
        }
      });
    })
  };

  let on_delete = {
    let api = props.api.clone();
    let notice = notice.clone();
    let notice_seq = notice_seq.clone();
    let tick = tick.clone();
    Callback::from(move |id: TaskId| {
      if !gloo::dialogs::confirm(
        "Delete this task?"
      ) {
        return;
      }
      let api = api.clone();
      let notice = notice.clone();
      let notice_seq = notice_seq.clone();
      let tick = tick.clone();
      wasm_bindgen_futures::spawn_local(async move {
        run_mutation(&api, Mutation::Delete(id), &notice, &notice_seq, &tick).await;
      });
    })
  };

  let on_modal_submit = {
    let api = props.api.clone();
    let renderer = renderer.clone();
    let modal_state = modal_state.clone();
    let modal_busy = modal_busy.clone();
    let notice = notice.clone();
    let notice_seq = notice_seq.clone();
    let tick = tick.clone();
    Callback::from(move |state: ModalState| {
      let fields = match state.to_fields(renderer.timezone()) {
        | Ok(fields) => fields,
        | Err(message) => {
          let mut next = state;
          next.error = Some(message);
          modal_state.set(Some(next));
          return;
        }
      };
      let mutation = match state.mode {
        | ModalMode::Add => Mutation::Create(fields),
        | ModalMode::Edit(id) => Mutation::Replace(id, fields)
      };

      modal_busy.set(true);
      let api = api.clone();
      let modal_state = modal_state.clone();
      let modal_busy = modal_busy.clone();
      let notice = notice.clone();
      let notice_seq = notice_seq.clone();
      let tick = tick.clone();
      wasm_bindgen_futures::spawn_local(async move {
        let outcome = run_mutation(&api, mutation, &notice, &notice_seq, &tick).await;
        modal_busy.set(false);
        if outcome.is_success() {
          modal_state.set(None);
        } else {
          let mut next = state;
          next.error = Some(outcome.message().to_string());
          modal_state.set(Some(next));
        }
      });
    })
  };

  let on_modal_close = {
    let modal_state = modal_state.clone();
    let modal_busy = modal_busy.clone();
    Callback::from(move |_: MouseEvent| {
      if !*modal_busy {
        modal_state.set(None);
      }
    })
  };

  let on_add = {
    let modal_state = modal_state.clone();
    Callback::from(move |_: MouseEvent| {
      modal_state.set(Some(ModalState::add()))
    })
  };

  let on_toggle_lane = {
    let collapsed = collapsed.clone();
    Callback::from(move |lane: Lane| {
      let mut next = (*collapsed).clone();
      if !next.remove(&lane) {
        next.insert(lane);
      }
      collapsed.set(next);
    })
  };

  let on_toggle_filters = {
    let filters_open = filters_open.clone();
    Callback::from(move |_: MouseEvent| {
      filters_open.set(!*filters_open)
    })
  };

  let on_filter_change = {
    let query = query.clone();
    Callback::from(move |next: LaneQuery| {
      tracing::info!(query = %next.to_query_string(), "lane filter changed");
      query.set(next)
    })
  };

  let on_search = {
    let search = search.clone();
    Callback::from(move |value: String| {
      search.set(value)
    })
  };

  let on_clear_filters = {
    let query = query.clone();
    let search = search.clone();
    Callback::from(move |_: MouseEvent| {
      query.set(LaneQuery::default());
      search.set(String::new());
    })
  };

  let on_dismiss = {
    let notice = notice.clone();
    Callback::from(move |_: MouseEvent| {
      notice.set(None)
    })
  };

  let search_cards = if search.trim().is_empty() {
    None
  } else {
    let hits = filter_tasks(&all_tasks, &search);
    Some(renderer.search_view(&hits))
  };

  html! {
      <div class="app">
          <div class="topbar">
              <div class="brand">{ "Tasks" }</div>
              <button class="btn" onclick={on_toggle_filters}>
                  { if *filters_open { "Hide filters" } else { "Show filters" } }
              </button>
              <button class="btn ok" onclick={on_add}>{ "Add Task" }</button>
          </div>
          <NoticeBanner notice={(*notice).clone()} on_dismiss={on_dismiss} />
          {
              if *filters_open {
                  html! {
                      <FilterBar
                          query={(*query).clone()}
                          search={(*search).clone()}
                          on_change={on_filter_change}
                          on_search={on_search}
                          on_clear={on_clear_filters}
                      />
                  }
              } else {
                  html! {}
              }
          }
          {
              if let Some(cards) = search_cards {
                  html! {
                      <SearchResults
                          query={(*search).clone()}
                          cards={cards}
                          on_edit={on_edit.clone()}
                      />
                  }
              } else {
                  html! {}
              }
          }
          <KanbanBoard
              lanes={(*lanes).clone()}
              collapsed={(*collapsed).clone()}
              dragging_task={drag.dragging()}
              drag_over_lane={drag.over_lane()}
              on_drop={on_drop}
              on_drag_start={on_drag_start}
              on_drag_end={on_drag_end}
              on_drag_over_lane={on_drag_over_lane}
              on_toggle_lane={on_toggle_lane}
              on_move={on_move}
              on_edit={on_edit}
              on_delete={on_delete}
          />
          <TaskModal
              modal_state={modal_state.clone()}
              modal_busy={*modal_busy}
              on_submit={on_modal_submit}
              on_close={on_modal_close}
          />
      </div>
  }
}
