use tasky_core::drag::PAYLOAD_MIME;
use tasky_core::render::LaneView;
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

use super::KanbanCard;

#[derive(Properties, PartialEq)]
pub struct KanbanColumnProps {
  pub lane:              LaneView,
  pub collapsed:         bool,
  pub dragging_task:     Option<TaskId>,
  pub drag_over_lane:    Option<Lane>,
  pub on_drop: Callback<(Lane, String)>,
  pub on_drag_start:     Callback<TaskId>,
  pub on_drag_end:       Callback<()>,
  pub on_drag_over_lane: Callback<Lane>,
  pub on_toggle_lane:    Callback<Lane>,
  pub on_move: Callback<(TaskId, Lane)>,
  pub on_edit:           Callback<TaskId>,
  pub on_delete:         Callback<TaskId>
}

#[function_component(KanbanColumn)]
pub fn kanban_column(
  props: &KanbanColumnProps
) -> Html {
  let lane = props.lane.lane;
  let is_drop_hint =
    props.drag_over_lane == Some(lane);

  let ondragover = {
    let on_drag_over_lane =
      props.on_drag_over_lane.clone();
    Callback::from(
      move |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
        on_drag_over_lane.emit(lane);
      }
    )
  };

  let ondragenter = {
    let on_drag_over_lane =
      props.on_drag_over_lane.clone();
    Callback::from(
      move |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
        on_drag_over_lane.emit(lane);
      }
    )
  };

  let ondrop = {
    let on_drop = props.on_drop.clone();
    let on_drag_end =
      props.on_drag_end.clone();
    Callback::from(
      move |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
        let payload = event
          .data_transfer()
          .map(|data_transfer| {
            data_transfer
              .get_data(PAYLOAD_MIME)
          });
        match payload {
          | Some(Ok(raw)) => {
            on_drop.emit((lane, raw))
          }
          | Some(Err(error)) => {
            tracing::warn!(
              ?error,
              "failed reading drag data"
            );
            on_drag_end.emit(());
          }
          | None => on_drag_end.emit(())
        }
      }
    )
  };

  let on_header_click = {
    let on_toggle_lane =
      props.on_toggle_lane.clone();
    Callback::from(move |_| {
      on_toggle_lane.emit(lane)
    })
  };

  html! {
      <div
          id={lane.drop_id()}
          class={classes!("kanban-column", is_drop_hint.then_some("drop-hint"))}
          {ondragover}
          {ondragenter}
          {ondrop}
      >
          <div class="kanban-column-header" onclick={on_header_click}>
              <span>{ props.lane.heading }</span>
              <span class="badge">{ props.lane.count_label.clone() }</span>
              <span class="collapse-toggle">{ if props.collapsed { "+" } else { "-" } }</span>
          </div>
          {
              if props.collapsed {
                  html! {}
              } else {
                  html! {
                      <div class="kanban-column-body">
                          {
                              if props.lane.cards.is_empty() {
                                  html! { <div class="kanban-empty">{ "No tasks" }</div> }
                              } else {
                                  html! {
                                      <>
                                          {
                                              for props.lane.cards.iter().cloned().map(|card| {
                                                  let is_dragging = props.dragging_task == Some(card.id);
                                                  html! {
                                                      <KanbanCard
                                                          card={card}
                                                          is_dragging={is_dragging}
                                                          on_drag_start={props.on_drag_start.clone()}
                                                          on_drag_end={props.on_drag_end.clone()}
                                                          on_move={props.on_move.clone()}
                                                          on_edit={props.on_edit.clone()}
                                                          on_delete={props.on_delete.clone()}
                                                      />
                                                  }
                                              })
                                          }
                                      </>
                                  }
                              }
                          }
                      </div>
                  }
              }
          }
      </div>
  }
}
