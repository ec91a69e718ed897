mod api;
mod app;
mod components;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    "starting Tasky board frontend"
  );

  let Some(mount) = web_sys::window()
    .and_then(|window| {
      window.document()
    })
    .and_then(|document| {
      document.get_element_by_id("app")
    })
  else {
    tracing::error!(
      "missing #app mount element"
    );
    return;
  };

  let api =
    match api::GlooTaskApi::same_origin() {
      | Ok(api) => api,
      | Err(err) => {
        tracing::error!(error = %err, "cannot reach task service");
        return;
      }
    };

  yew::Renderer::<app::App>::with_root_and_props(
    mount,
    app::AppProps {
      api
    }
  )
  .render();
}
