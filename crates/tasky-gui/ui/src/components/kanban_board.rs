use std::collections::BTreeSet;

use tasky_core::render::LaneView;
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

use super::KanbanColumn;

#[derive(Properties, PartialEq)]
pub struct KanbanBoardProps {
  pub lanes:             Vec<LaneView>,
  pub collapsed:         BTreeSet<Lane>,
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

#[function_component(KanbanBoard)]
pub fn kanban_board(
  props: &KanbanBoardProps
) -> Html {
  html! {
      <div class="panel kanban-panel">
          <div class="kanban-board">
              {
                  for props.lanes.iter().cloned().map(|lane| {
                      let collapsed = props.collapsed.contains(&lane.lane);
                      html! {
                          <KanbanColumn
                              lane={lane}
                              collapsed={collapsed}
                              dragging_task={props.dragging_task}
                              drag_over_lane={props.drag_over_lane}
                              on_drop={props.on_drop.clone()}
                              on_drag_start={props.on_drag_start.clone()}
                              on_drag_end={props.on_drag_end.clone()}
                              on_drag_over_lane={props.on_drag_over_lane.clone()}
                              on_toggle_lane={props.on_toggle_lane.clone()}
                              on_move={props.on_move.clone()}
                              on_edit={props.on_edit.clone()}
                              on_delete={props.on_delete.clone()}
                          />
                      }
                  })
              }
          </div>
      </div>
  }
}
