use tasky_core::board::Notice;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct NoticeBannerProps {
  pub notice:     Option<Notice>,
  pub on_dismiss: Callback<MouseEvent>
}

#[function_component(NoticeBanner)]
pub fn notice_banner(
  props: &NoticeBannerProps
) -> Html {
  let Some(notice) = &props.notice else {
    return html! {};
  };
  let tone = if notice.is_success() {
    "ok"
  } else {
    "danger"
  };
  html! {
      <div class={classes!("banner", tone)} role="status">
          <span>{ notice.message() }</span>
          <button class="btn" onclick={props.on_dismiss.clone()}>{ "Dismiss" }</button>
      </div>
  }
}
