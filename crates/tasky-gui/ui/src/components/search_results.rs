use tasky_core::render::CardView;
use tasky_shared::TaskId;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct SearchResultsProps {
  pub query:   String,
  pub cards:   Vec<CardView>,
  pub on_edit: Callback<TaskId>
}

#[function_component(SearchResults)]
pub fn search_results(
  props: &SearchResultsProps
) -> Html {
  html! {
      <div class="panel list">
          <div class="header">{ format!("Search: {}", props.query) }</div>
          {
              if props.cards.is_empty() {
                  html! { <div class="kanban-empty">{ "No matching tasks" }</div> }
              } else {
                  html! {
                      <>
                          {
                              for props.cards.iter().map(|card| {
                                  let id = card.id;
                                  let on_edit = props.on_edit.clone();
                                  let lane = card
                                      .lane
                                      .map(|lane| lane.title().to_string())
                                      .unwrap_or_else(|| card.status_label.clone());
                                  html! {
                                      <div class="row" onclick={move |_| on_edit.emit(id)}>
                                          <span class={classes!("dot", card.status_tone.map(|tone| tone.css_class()))}></span>
                                          <div>
                                              <div>{ &card.title }</div>
                                              <div class="task-subtitle">
                                                  { format!("{lane} · due {} {}", card.due_date_label, card.due_time_label) }
                                              </div>
                                          </div>
                                      </div>
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
