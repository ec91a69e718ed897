use chrono_tz::Tz;
use tasky_core::board::EditForm;
use tasky_shared::{
  Lane,
  PriorityCode,
  StatusCode,
  TaskFields,
  TaskId,
  parse_due_input
};
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  TargetCast,
  UseStateHandle,
  function_component,
  html
};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ModalMode {
  Add,
  Edit(TaskId)
}

#[derive(Clone, PartialEq, Debug)]
pub struct ModalState {
  pub mode:           ModalMode,
  pub draft_title:    String,
  pub draft_desc:     String,
  pub draft_status:   String,
  pub draft_priority: String,
  pub draft_due:      String,
  pub draft_category: String,
  pub error:          Option<String>
}

impl ModalState {
  pub fn add() -> Self {
    Self {
      mode:           ModalMode::Add,
      draft_title:    String::new(),
      draft_desc:     String::new(),
      draft_status:   StatusCode::InProgress
        .code()
        .to_string(),
      draft_priority: PriorityCode::Medium
        .code()
        .to_string(),
      draft_due:      String::new(),
      draft_category: String::new(),
      error:          None
    }
  }

  pub fn edit(form: EditForm) -> Self {
    Self {
      mode:           ModalMode::Edit(
        form.id
      ),
      draft_title:    form.title,
      draft_desc:     form.description,
      draft_status:   form
        .status
        .code()
        .to_string(),
      draft_priority: form
        .priority
        .code()
        .to_string(),
      draft_due:      form.due_date,
      draft_category: form.category,
      error:          None
    }
  }

  /// Validated request body, or the
  /// message to show inside the form.
  /// The due field is wall-clock time in
  /// `zone`.
  pub fn to_fields(
    &self,
    zone: Tz
  ) -> Result<TaskFields, String> {
    if self.draft_title.trim().is_empty() {
      return Err(
        "Title is required.".to_string()
      );
    }
    let Some(due_date) =
      parse_due_input(&self.draft_due, &zone)
    else {
      return Err(
        "Enter a due date and time."
          .to_string()
      );
    };
    Ok(TaskFields {
      title: self.draft_title.trim().to_string(),
      description: self.draft_desc.clone(),
      status: StatusCode::from(
        self.draft_status.as_str()
      ),
      priority: PriorityCode::from(
        self.draft_priority.as_str()
      ),
      due_date,
      category: self
        .draft_category
        .trim()
        .to_string()
    })
  }
}

#[derive(Properties, PartialEq)]
pub struct TaskModalProps {
  pub modal_state:
    UseStateHandle<Option<ModalState>>,
  pub modal_busy:  bool,
  pub on_submit:   Callback<ModalState>,
  pub on_close:    Callback<MouseEvent>
}

fn update(
  modal_state: &UseStateHandle<
    Option<ModalState>
  >,
  apply: impl FnOnce(&mut ModalState)
) {
  if let Some(mut current) =
    (**modal_state).clone()
  {
    apply(&mut current);
    current.error = None;
    modal_state.set(Some(current));
  }
}

#[function_component(TaskModal)]
pub fn task_modal(
  props: &TaskModalProps
) -> Html {
  let Some(state) =
    (*props.modal_state).clone()
  else {
    return html! {};
  };
  let modal_state =
    props.modal_state.clone();

  let on_title_input = {
    let modal_state = modal_state.clone();
    Callback::from(move |e: web_sys::InputEvent| {
      let input: web_sys::HtmlInputElement = e.target_unchecked_into();
      update(&modal_state, |current| current.draft_title = input.value());
    })
  };
  let on_desc_input = {
    let modal_state = modal_state.clone();
    Callback::from(move |e: web_sys::InputEvent| {
      let input: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
      update(&modal_state, |current| current.draft_desc = input.value());
    })
  };
  let on_status_change = {
    let modal_state = modal_state.clone();
    Callback::from(move |e: web_sys::Event| {
      let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
      update(&modal_state, |current| current.draft_status = select.value());
    })
  };
  let on_priority_change = {
    let modal_state = modal_state.clone();
    Callback::from(move |e: web_sys::Event| {
      let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
      update(&modal_state, |current| current.draft_priority = select.value());
    })
  };
  let on_due_input = {
    let modal_state = modal_state.clone();
    Callback::from(move |e: web_sys::InputEvent| {
      let input: web_sys::HtmlInputElement = e.target_unchecked_into();
      update(&modal_state, |current| current.draft_due = input.value());
    })
  };
  let on_category_input = {
    let modal_state = modal_state.clone();
    Callback::from(move |e: web_sys::InputEvent| {
      let input: web_sys::HtmlInputElement = e.target_unchecked_into();
      update(&modal_state, |current| current.draft_category = input.value());
    })
  };
  let on_save_click = {
    let on_submit = props.on_submit.clone();
    let submit_state = state.clone();
    Callback::from(move |_| on_submit.emit(submit_state.clone()))
  };

  html! {
      <div class="modal-backdrop" onclick={props.on_close.clone()}>
          <div class="modal" onclick={Callback::from(|e: MouseEvent| e.stop_propagation())}>
              <div class="header">
                  {
                      match state.mode {
                          ModalMode::Add => "Add Task",
                          ModalMode::Edit(_) => "Edit Task",
                      }
                  }
              </div>
              <div class="content">
                  {
                      if let Some(err) = state.error.clone() {
                          html! { <div class="form-error">{ err }</div> }
                      } else {
                          html! {}
                      }
                  }
                  <div class="field">
                      <label>{ "Title" }</label>
                      <input value={state.draft_title.clone()} placeholder="Required task title" oninput={on_title_input} />
                  </div>
                  <div class="field">
                      <label>{ "Description" }</label>
                      <textarea value={state.draft_desc.clone()} oninput={on_desc_input} />
                  </div>
                  <div class="field">
                      <label>{ "Status" }</label>
                      <select class="tag-select" value={state.draft_status.clone()} onchange={on_status_change}>
                          {
                              for Lane::ALL.into_iter().map(|lane| html! {
                                  <option value={lane.drop_id()} selected={state.draft_status == lane.drop_id()}>
                                      { lane.title() }
                                  </option>
                              })
                          }
                      </select>
                  </div>
                  <div class="field">
                      <label>{ "Priority" }</label>
                      <select class="tag-select" value={state.draft_priority.clone()} onchange={on_priority_change}>
                          {
                              for [PriorityCode::High, PriorityCode::Medium, PriorityCode::Low].into_iter().map(|priority| html! {
                                  <option value={priority.code().to_string()} selected={state.draft_priority == priority.code()}>
                                      { priority.label() }
                                  </option>
                              })
                          }
                      </select>
                  </div>
                  <div class="field">
                      <label>{ "Due" }</label>
                      <input type="datetime-local" value={state.draft_due.clone()} oninput={on_due_input} />
                  </div>
                  <div class="field">
                      <label>{ "Category" }</label>
                      <input value={state.draft_category.clone()} oninput={on_category_input} />
                  </div>
              </div>
              <div class="footer">
                  <button class="btn" onclick={props.on_close.clone()} disabled={props.modal_busy}>{ "Cancel" }</button>
                  <button class="btn ok" onclick={on_save_click} disabled={props.modal_busy}>
                      { if props.modal_busy { "Saving..." } else { "Save" } }
                  </button>
              </div>
          </div>
      </div>
  }
}
