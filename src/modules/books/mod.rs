pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;

use bookshelf_kernel::{Clock, InitCtx, Module, SystemClock};

use store::Shelf;

/// Books module: owns the in-memory shelf and exposes the CRUD routes.
pub struct BooksModule {
    shelf: Arc<Shelf>,
}

impl BooksModule {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            shelf: Arc::new(Shelf::new(clock)),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.shelf.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "reading",
                                "in": "query",
                                "schema": { "type": "string", "enum": ["0", "1"] },
                                "description": "Only books with the given reading flag"
                            },
                            {
                                "name": "finished",
                                "in": "query",
                                "schema": { "type": "string", "enum": ["0", "1"] },
                                "description": "Only books with the given finished flag"
                            },
                            {
                                "name": "name",
                                "in": "query",
                                "schema": { "type": "string" },
                                "description": "Case-insensitive substring of the book name"
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Projections of every matching book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ResponseEnvelope" }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Add a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPayload" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Book added; data carries the new bookId",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ResponseEnvelope" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Missing name, or readPage greater than pageCount"
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book by id",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string" }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "The full book record",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": { "description": "Book not found" }
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string" }
                            }
                        ],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPayload" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Book updated" },
                            "400": { "description": "Invalid payload" },
                            "404": { "description": "Book not found" }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string" }
                            }
                        ],
                        "responses": {
                            "200": { "description": "Book deleted" },
                            "404": { "description": "Book not found" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "year": { "type": "integer" },
                            "author": { "type": "string" },
                            "summary": { "type": "string" },
                            "publisher": { "type": "string" },
                            "pageCount": { "type": "integer", "minimum": 0 },
                            "readPage": { "type": "integer", "minimum": 0 },
                            "finished": { "type": "boolean" },
                            "reading": { "type": "boolean" },
                            "insertedAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "pageCount", "readPage", "finished", "reading", "insertedAt", "updatedAt"]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "year": { "type": "integer" },
                            "author": { "type": "string" },
                            "summary": { "type": "string" },
                            "publisher": { "type": "string" },
                            "pageCount": { "type": "integer", "minimum": 0 },
                            "readPage": { "type": "integer", "minimum": 0 },
                            "reading": { "type": "boolean" }
                        },
                        "required": ["name"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module with the system clock.
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(SystemClock)))
}
