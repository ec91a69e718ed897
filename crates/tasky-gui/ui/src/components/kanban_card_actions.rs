use tasky_shared::{
  Lane,
  TaskId
};
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct KanbanCardActionsProps {
  pub task_id:   TaskId,
  pub lane:      Option<Lane>,
  pub on_move: Callback<(TaskId, Lane)>,
  pub on_edit:   Callback<TaskId>,
  pub on_delete: Callback<TaskId>
}

/// Button fallback for moving a card
/// without dragging it.
#[function_component(KanbanCardActions)]
pub fn kanban_card_actions(
  props: &KanbanCardActionsProps
) -> Html {
  let task_id = props.task_id;
  html! {
      <div class="kanban-card-actions">
          <button class="btn" onclick={{
              let on_edit = props.on_edit.clone();
              Callback::from(move |_| on_edit.emit(task_id))
          }}>{ "Edit" }</button>
          {
              for Lane::ALL
                  .into_iter()
                  .filter(|lane| Some(*lane) != props.lane)
                  .map(|lane| {
                      let on_move = props.on_move.clone();
                      html! {
                          <button class="btn" onclick={Callback::from(move |_| on_move.emit((task_id, lane)))}>
                              { format!("Move to {}", lane.title()) }
                          </button>
                      }
                  })
          }
          <button class="btn danger" onclick={{
              let on_delete = props.on_delete.clone();
              Callback::from(move |_| on_delete.emit(task_id))
          }}>{ "Delete" }</button>
      </div>
  }
}
