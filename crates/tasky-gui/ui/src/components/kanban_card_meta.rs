use tasky_core::render::CardView;
use yew::{
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct KanbanCardMetaProps {
  pub card: CardView
}

#[function_component(KanbanCardMeta)]
pub fn kanban_card_meta(
  props: &KanbanCardMetaProps
) -> Html {
  let card = &props.card;
  html! {
      <div class="kanban-card-meta">
          <span class={classes!("badge", card.status_tone.map(|tone| tone.css_class()))}>
              { &card.status_label }
          </span>
          <span class={classes!("badge", card.priority_tone.map(|tone| tone.css_class()))}>
              { &card.priority_label }
          </span>
          {
              if card.category.trim().is_empty() {
                  html! {}
              } else {
                  html! { <span class="badge">{ &card.category }</span> }
              }
          }
          <span class="badge due">
              <span>{ &card.due_date_label }</span>
              { " " }
              <span>{ &card.due_time_label }</span>
          </span>
      </div>
  }
}
