use tasky_core::query::LaneQuery;
use tasky_shared::PriorityCode;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  TargetCast,
  function_component,
  html
};

const ORDERINGS: [(&str, &str); 7] = [
  ("", "Default order"),
  ("due_date", "Due (soonest)"),
  ("-due_date", "Due (latest)"),
  ("title", "Title A-Z"),
  ("-title", "Title Z-A"),
  ("priority", "Priority"),
  ("category", "Category")
];

#[derive(Properties, PartialEq)]
pub struct FilterBarProps {
  pub query:     LaneQuery,
  pub search:    String,
  pub on_change: Callback<LaneQuery>,
  pub on_search: Callback<String>,
  pub on_clear:  Callback<MouseEvent>
}

fn non_empty(value: String) -> Option<String> {
  if value.trim().is_empty() {
    None
  } else {
    Some(value)
  }
}

#[function_component(FilterBar)]
pub fn filter_bar(
  props: &FilterBarProps
) -> Html {
  let on_priority_change = {
    let query = props.query.clone();
    let on_change = props.on_change.clone();
    Callback::from(move |e: web_sys::Event| {
      let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
      let mut next = query.clone();
      next.priority = non_empty(select.value()).map(PriorityCode::from);
      on_change.emit(next);
    })
  };
  let on_due_change = {
    let query = props.query.clone();
    let on_change = props.on_change.clone();
    Callback::from(move |e: web_sys::Event| {
      let input: web_sys::HtmlInputElement = e.target_unchecked_into();
      let mut next = query.clone();
      next.due_date = non_empty(input.value());
      on_change.emit(next);
    })
  };
  let on_category_change = {
    let query = props.query.clone();
    let on_change = props.on_change.clone();
    Callback::from(move |e: web_sys::Event| {
      let input: web_sys::HtmlInputElement = e.target_unchecked_into();
      let mut next = query.clone();
      next.category = non_empty(input.value());
      on_change.emit(next);
    })
  };
  let on_ordering_change = {
    let query = props.query.clone();
    let on_change = props.on_change.clone();
    Callback::from(move |e: web_sys::Event| {
      let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
      let mut next = query.clone();
      next.ordering = non_empty(select.value());
      on_change.emit(next);
    })
  };
  let on_search_input = {
    let on_search = props.on_search.clone();
    Callback::from(move |e: web_sys::InputEvent| {
      let input: web_sys::HtmlInputElement = e.target_unchecked_into();
      on_search.emit(input.value());
    })
  };

  let priority_value = props
    .query
    .priority
    .as_ref()
    .map(|priority| priority.code().to_string())
    .unwrap_or_default();
  let ordering_value = props.query.ordering.clone().unwrap_or_default();

  html! {
      <div class="panel filters">
          <div class="field">
              <label>{ "Search" }</label>
              <input
                  type="search"
                  value={props.search.clone()}
                  placeholder="Title, description or category"
                  oninput={on_search_input}
              />
          </div>
          <div class="field">
              <label>{ "Priority" }</label>
              <select class="tag-select" value={priority_value} onchange={on_priority_change}>
                  <option value="">{ "Any" }</option>
                  {
                      for [PriorityCode::High, PriorityCode::Medium, PriorityCode::Low].into_iter().map(|priority| html! {
                          <option value={priority.code().to_string()}>{ priority.label() }</option>
                      })
                  }
              </select>
          </div>
          <div class="field">
              <label>{ "Due on" }</label>
              <input type="date" value={props.query.due_date.clone().unwrap_or_default()} onchange={on_due_change} />
          </div>
          <div class="field">
              <label>{ "Category" }</label>
              <input value={props.query.category.clone().unwrap_or_default()} onchange={on_category_change} />
          </div>
          <div class="field">
              <label>{ "Order" }</label>
              <select class="tag-select" value={ordering_value} onchange={on_ordering_change}>
                  {
                      for ORDERINGS.iter().map(|(value, label)| html! {
                          <option value={*value}>{ *label }</option>
                      })
                  }
              </select>
          </div>
          <button class="btn" onclick={props.on_clear.clone()}>{ "Clear filters" }</button>
      </div>
  }
}
