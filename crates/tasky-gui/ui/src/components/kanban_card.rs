use tasky_core::drag::PAYLOAD_MIME;
use tasky_core::render::CardView;
use tasky_shared::{
  Lane,
  TaskId
};
use web_sys::DragEvent;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

use super::{
  KanbanCardActions,
  KanbanCardMeta
};

#[derive(Properties, PartialEq)]
pub struct KanbanCardProps {
  pub card:          CardView,
  pub is_dragging:   bool,
  pub on_drag_start: Callback<TaskId>,
  pub on_drag_end:   Callback<()>,
  pub on_move: Callback<(TaskId, Lane)>,
  pub on_edit:       Callback<TaskId>,
  pub on_delete:     Callback<TaskId>
}

#[function_component(KanbanCard)]
pub fn kanban_card(
  props: &KanbanCardProps
) -> Html {
  let task_id = props.card.id;
  let ondragstart = {
    let on_drag_start =
      props.on_drag_start.clone();
    let payload =
      props.card.drag_payload.clone();
    Callback::from(
      move |event: DragEvent| {
        if let Some(data_transfer) =
          event.data_transfer()
        {
          if let Err(error) = data_transfer
            .set_data(PAYLOAD_MIME, &payload)
          {
            tracing::warn!(
              ?error,
              "failed writing drag data"
            );
          }
          data_transfer
            .set_drop_effect("move");
        }
        on_drag_start.emit(task_id);
      }
    )
  };

  let ondragend = {
    let on_drag_end =
      props.on_drag_end.clone();
    Callback::from(move |_| {
      on_drag_end.emit(());
    })
  };

  let [(_, id_value), (_, status_value)] =
    props.card.data_attributes();
  let status_class = props
    .card
    .status_tone
    .map(|tone| tone.css_class());

  html! {
      <div
          class={classes!("kanban-card", status_class, props.is_dragging.then_some("dragging"))}
          draggable="true"
          data-id={id_value}
          data-status={status_value}
          {ondragstart}
          {ondragend}
      >
          <div class="kanban-card-title">{ &props.card.title }</div>
          {
              if props.card.description.trim().is_empty() {
                  html! {}
              } else {
                  html! { <div class="task-subtitle">{ &props.card.description }</div> }
              }
          }
          <KanbanCardMeta card={props.card.clone()} />
          <KanbanCardActions
              task_id={task_id}
              lane={props.card.lane}
              on_move={props.on_move.clone()}
              on_edit={props.on_edit.clone()}
              on_delete={props.on_delete.clone()}
          />
      </div>
  }
}
