use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use log::info;
use serde::Deserialize;
use rs_wordex_core::io::list_files;
use rs_wordex_core::model::extraction_input::DEFAULT_MAX_WORD_LEN;
use rs_wordex_core::{CorpusIndex, SuppressionPolicy, WordExtractor};

/// Struct representing query parameters for the `/v1/extract` endpoint
#[derive(Deserialize)]
struct ExtractParams {
	threshold: Option<f64>,
	limit: Option<usize>,
	policy: Option<SuppressionPolicy>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
	max_word_len: Option<usize>,
}

struct SharedData {
	corpus_name: Option<String>,
	index: Option<CorpusIndex>,
}

/// HTTP GET endpoint `/v1/extract`
///
/// Extracts the words of the loaded corpus and returns the ranked rows as JSON.
#[get("/v1/extract")]
async fn get_extracted(data: web::Data<Mutex<SharedData>>, query: web::Query<ExtractParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Index lock failed"),
	};

	let index = match &shared_data.index {
		Some(index) => index,
		None => return HttpResponse::Conflict().body("No corpus loaded"),
	};

	let extractor = WordExtractor::new(index).with_policy(query.policy.unwrap_or_default());
	match extractor.extract_words(query.threshold) {
		Ok(table) => {
			let limit = query.limit.unwrap_or(table.len());
			HttpResponse::Ok().json(table.top(limit))
		}
		Err(e) => HttpResponse::BadRequest().body(e.to_string()),
	}
}

#[get("/v1/corpora")]
async fn get_corpora() -> impl Responder {
	match list_files("./data", "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".txt", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpus")]
async fn get_loaded_corpus(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Index lock failed"),
	};
	HttpResponse::Ok().body(shared_data.corpus_name.clone().unwrap_or_default())
}

#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.starts_with('.') {
		return HttpResponse::BadRequest().body("Invalid corpus name");
	}
	let max_word_len = query.max_word_len.unwrap_or(DEFAULT_MAX_WORD_LEN);

	// Indexing may take a while: keep the lock out of it
	let corpus_path = format!("./data/{name}.txt");
	let index = match web::block(move || CorpusIndex::from_file(corpus_path, max_word_len)).await {
		Ok(Ok(index)) => index,
		Ok(Err(e)) => return HttpResponse::BadRequest().body(format!("Failed to load corpus: {e}")),
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}")),
	};

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Index lock failed"),
	};
	info!("corpus {name} loaded, {} candidates", index.vocabulary().len());
	shared_data.index = Some(index);
	shared_data.corpus_name = Some(name);

	HttpResponse::Ok().body("Corpus loaded successfully")
}

/// Main entry point for the server.
///
/// Wraps the corpus index in a `Mutex` and starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - Corpora are read from `./data/<name>.txt`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let shared_data = SharedData {
		corpus_name: None,
		index: None,
	};
	let shared_index = web::Data::new(Mutex::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_index.clone())
			.service(get_extracted)
			.service(get_corpora)
			.service(put_corpus)
			.service(get_loaded_corpus)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
