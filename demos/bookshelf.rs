//! Bookshelf: a two-slice application.
//!
//! ```text
//! cargo run --example bookshelf -- server --port 2300
//! cargo run --example bookshelf -- routes
//! ```

use std::sync::{Arc, RwLock};

use axum::http::StatusCode;
use clap::Parser;
use serde::Serialize;

use hanami::application::{Application, ApplicationBuilder};
use hanami::cli::{self, Cli};
use hanami::components::Resolved;
use hanami::config::AppConfig;
use hanami::rendering::view_fn;
use hanami::slices::{action_fn, ActionError, Slice};

#[derive(Debug, Clone, Serialize)]
struct Book {
    id: usize,
    title: String,
}

#[derive(Default)]
struct BookRepo {
    books: RwLock<Vec<Book>>,
}

impl BookRepo {
    fn all(&self) -> Vec<Book> {
        self.books.read().map(|b| b.clone()).unwrap_or_default()
    }

    fn find(&self, id: usize) -> Option<Book> {
        self.all().into_iter().find(|b| b.id == id)
    }

    fn create(&self, title: &str) -> Option<Book> {
        let mut books = self.books.write().ok()?;
        let book = Book {
            id: books.len() + 1,
            title: title.to_string(),
        };
        books.push(book.clone());
        Some(book)
    }
}

fn web() -> Slice {
    Slice::builder("web")
        .prefix("/")
        .requires("repos.books")
        .action_with("books.index", |deps| {
            let repo = deps.get_as::<BookRepo>("repos.books")?;
            Ok(action_fn(move |_, res| res.expose("books", repo.all())))
        })
        .action_with("books.show", |deps| {
            let repo = deps.get_as::<BookRepo>("repos.books")?;
            Ok(action_fn(move |req, res| {
                let book = req
                    .param("id")
                    .and_then(|id| id.parse().ok())
                    .and_then(|id| repo.find(id))
                    .ok_or(ActionError::halt(StatusCode::NOT_FOUND))?;
                res.expose("book", book)
            }))
        })
        .action_with("books.create", |deps| {
            let repo = deps.get_as::<BookRepo>("repos.books")?;
            Ok(action_fn(move |req, res| {
                let title = req
                    .param("title")
                    .filter(|t| !t.trim().is_empty())
                    .ok_or(ActionError::halt(StatusCode::UNPROCESSABLE_ENTITY))?;
                let book = repo
                    .create(title)
                    .ok_or_else(|| ActionError::failed("book store unavailable"))?;
                res.redirect_to(&format!("/books/{}", book.id), StatusCode::SEE_OTHER)
            }))
        })
        .view(
            "Views::Books::Index",
            view_fn(|ctx| {
                let items: String = ctx
                    .exposures
                    .get("books")
                    .and_then(|b| b.as_array())
                    .map(|books| {
                        books
                            .iter()
                            .filter_map(|b| b.get("title").and_then(|t| t.as_str()))
                            .map(|t| format!("<li>{t}</li>"))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(format!("<h1>Books</h1><ul>{items}</ul>"))
            }),
        )
        .view(
            "Views::Books::Show",
            view_fn(|ctx| {
                let title = ctx
                    .exposures
                    .get("book")
                    .and_then(|b| b.get("title"))
                    .and_then(|t| t.as_str())
                    .unwrap_or_default();
                Ok(format!("<h1>{title}</h1>"))
            }),
        )
        .get("/books", "books.index")
        .named("books")
        .get("/books/:id", "books.show")
        .named("book")
        .post("/books", "books.create")
        .build()
}

fn admin() -> Slice {
    Slice::builder("admin")
        .prefix("/admin")
        .action(
            "dashboard.show",
            action_fn(|_, res| {
                res.set_body("admin dashboard");
                Ok(())
            }),
        )
        .get("/", "dashboard.show")
        .build()
}

fn bookshelf(config: AppConfig) -> ApplicationBuilder {
    let repo = Arc::new(BookRepo::default());
    Application::builder(config)
        .component_fn("repos.books", Vec::<String>::new(), move |_| {
            Ok(Arc::clone(&repo) as Resolved)
        })
        .slice(web())
        .slice(admin())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli::run(cli, bookshelf).await?;
    Ok(())
}
