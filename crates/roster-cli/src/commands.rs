// SPDX-License-Identifier: AGPL-3.0
// Roster CLI - Command handlers
//
// One handler per screen of the app. Lists are fetched page by page the way
// infinite scroll would, then narrowed by the optional search text.

use crate::state::AppState;
use roster_core::{
    ApiClient, AppError, AppSettings, FavoriteUser, FavoritesView, FetchOutcome, ListController,
    ListView, PageSource, Post, Searchable, Task, User,
};

/// Fetch up to `pages` pages, apply `search`, and print the resulting view
async fn show_list<T>(
    mut controller: ListController<T, ApiClient>,
    pages: u32,
    search: Option<String>,
    render: impl Fn(&T) -> String,
) where
    T: Searchable + Clone + Send + Sync + 'static,
    ApiClient: PageSource<T>,
{
    for _ in 0..pages {
        match controller.fetch_next_page().await {
            FetchOutcome::Appended(_) => {}
            FetchOutcome::Failed => {
                tracing::warn!("Stopped loading {} after a failed page", controller.name());
                break;
            }
            FetchOutcome::Exhausted | FetchOutcome::Stale | FetchOutcome::Skipped => break,
        }
    }

    if let Some(text) = search {
        controller.set_search_text(text);
        controller.apply_search_now();
    }

    print_view(controller.view(), controller.name(), render);
}

fn print_view<T>(view: ListView<'_, T>, noun: &str, render: impl Fn(&T) -> String) {
    match view {
        ListView::All(items) | ListView::Filtered(items) => {
            for item in items {
                println!("{}", render(item));
            }
        }
        ListView::NoMatches { query } => println!("No {} match \"{}\"", noun, query),
        ListView::Empty => println!("No {} yet", noun),
    }
}

fn favorite_marker(state: &AppState, id: u64) -> &'static str {
    if state.favorites.is_favorite(id) {
        "*"
    } else {
        " "
    }
}

pub async fn users(state: &AppState, pages: u32, search: Option<String>) {
    let settings = state.settings.get();
    let controller = ListController::<User, _>::new(
        "users",
        state.client.clone(),
        settings.users_page_size,
        settings.search_debounce(),
    );

    show_list(controller, pages, search, |user| {
        format!(
            "{} {:>4}  {:<28} {:<30} {}",
            favorite_marker(state, user.id),
            user.id,
            user.name,
            user.email,
            user.phone.as_deref().unwrap_or("")
        )
    })
    .await;
}

pub async fn posts(state: &AppState, pages: u32, search: Option<String>) {
    let settings = state.settings.get();
    let controller = ListController::<Post, _>::new(
        "posts",
        state.client.clone(),
        settings.posts_page_size,
        settings.search_debounce(),
    );

    show_list(controller, pages, search, |post| {
        format!("{:>4}  {}", post.id, post.title)
    })
    .await;
}

pub async fn tasks(state: &AppState, pages: u32, search: Option<String>) {
    let settings = state.settings.get();
    let controller = ListController::<Task, _>::new(
        "tasks",
        state.client.clone(),
        settings.tasks_page_size,
        settings.search_debounce(),
    );

    show_list(controller, pages, search, |task| {
        let check = if task.completed { "[x]" } else { "[ ]" };
        format!("{} {}", check, task.title)
    })
    .await;
}

pub async fn post_detail(state: &AppState, id: u64) -> Result<(), AppError> {
    let detail = state.client.fetch_post_detail(id).await?;

    println!("{}", detail.post.title);
    println!();
    println!("{}", detail.post.body);
    println!();
    println!("Comments");
    for comment in &detail.comments {
        println!("- {} <{}>", comment.name, comment.email);
        println!("  {}", comment.body.replace('\n', "\n  "));
    }
    Ok(())
}

pub fn favorites(state: &AppState, search: Option<String>) {
    let mut view = FavoritesView::new(
        state.favorites.clone(),
        state.settings.get().search_debounce(),
    );
    view.on_focus();

    if let Some(text) = search {
        view.set_search_text(text);
        view.apply_search_now();
    }

    match view.view() {
        ListView::Empty => println!("No favorite users yet"),
        other => print_view(other, "favorite users", |user: &FavoriteUser| {
            format!("{:>4}  {:<28} {}", user.id, user.name, user.email)
        }),
    }
}

pub async fn toggle_favorite(state: &AppState, user_id: u64) -> Result<(), AppError> {
    let user = state.client.fetch_user(user_id).await?;

    if state.favorites.toggle_favorite(&user) {
        println!("Added {} to favorites", user.name);
    } else {
        println!("Removed {} from favorites", user.name);
    }
    Ok(())
}

/// Persist `update` if given, then print the effective settings
pub fn settings(state: &AppState, update: Option<AppSettings>) -> Result<(), AppError> {
    if let Some(new_settings) = update {
        state.settings.update(new_settings)?;
        println!("Settings saved");
    }

    let settings = state.settings.get();
    println!("# {}", state.settings.path().display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
