mod filter_bar;
mod kanban_board;
mod kanban_card;
mod kanban_card_actions;
mod kanban_card_meta;
mod kanban_column;
mod notice_banner;
mod search_results;
mod task_modal;

pub use filter_bar::FilterBar;
pub use kanban_board::KanbanBoard;
use kanban_card::KanbanCard;
use kanban_card_actions::KanbanCardActions;
use kanban_card_meta::KanbanCardMeta;
use kanban_column::KanbanColumn;
pub use notice_banner::NoticeBanner;
pub use search_results::SearchResults;
pub use task_modal::{
  ModalMode,
  ModalState,
  TaskModal
};
