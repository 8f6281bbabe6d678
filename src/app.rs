// Process-wide application state and invocation dispatch.
// Holds what survives between invocations in a warm execution environment.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{Instrument, error, info, info_span};

use crate::cache::{CacheClientFactory, CacheConnector, MemoryConnector, MomentoConnector};
use crate::config::{CacheBackend, Config, SecretsBackend};
use crate::error::Result;
use crate::handlers::weather::LOCATION_REQUIRED;
use crate::handlers::{NewsHandler, Response, UNEXPECTED_ERROR, WeatherEvent, WeatherHandler};
use crate::news::{HackerNewsClient, Story, StorySource};
use crate::secrets::{EnvSecretStore, ExtensionSecretStore, SecretProvider, SecretStore};
use crate::weather::{OpenWeatherClient, WeatherSnapshot, WeatherSource};

const USER_AGENT: &str = concat!("small-talk/", env!("CARGO_PKG_VERSION"));

/// The functions this process can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Function {
    #[serde(alias = "hacker-news")]
    News,
    Weather,
}

impl Function {
    pub fn name(&self) -> &'static str {
        match self {
            Function::News => "news",
            Function::Weather => "weather",
        }
    }
}

/// One line of the `serve` protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    pub function: Function,
    #[serde(default)]
    pub event: Value,
}

/// Main application state.
pub struct App {
    config: Config,
    secrets: Arc<SecretProvider>,
    cache_factory: CacheClientFactory,
    news: Arc<dyn StorySource>,
    weather: Arc<dyn WeatherSource>,
    /// Invocations handled so far, used to tag log spans.
    invocations: AtomicU64,
}

impl App {
    /// Build the real clients described by `config`.
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout)
            .build()?;

        let store: Arc<dyn SecretStore> = match config.secrets_backend {
            SecretsBackend::Extension => Arc::new(ExtensionSecretStore::new(
                client.clone(),
                config.secrets_extension_port,
                config.session_token.as_deref(),
            )?),
            SecretsBackend::Env => Arc::new(EnvSecretStore::new()),
        };
        let secrets = Arc::new(SecretProvider::new(store));

        let cache_factory = match config.cache_backend {
            CacheBackend::Momento => {
                let connector: Arc<dyn CacheConnector> = Arc::new(MomentoConnector::new(
                    client.clone(),
                    config.momento_endpoint.clone(),
                ));
                CacheClientFactory::new(secrets.clone(), connector, config.cache_secret.clone())
            }
            CacheBackend::Memory => CacheClientFactory::new(
                secrets.clone(),
                Arc::new(MemoryConnector::default()),
                config.cache_secret.clone(),
            ),
            CacheBackend::Disabled => CacheClientFactory::disabled(secrets.clone()),
        };

        let news = Arc::new(HackerNewsClient::new(client.clone(), config.news_url.clone()));
        let weather = Arc::new(OpenWeatherClient::new(
            client,
            config.weather_api_base.clone(),
            config.weather_units.clone(),
        ));

        Ok(Self::from_parts(config, secrets, cache_factory, news, weather))
    }

    /// Assemble an app from already-built parts.
    pub fn from_parts(
        config: Config,
        secrets: Arc<SecretProvider>,
        cache_factory: CacheClientFactory,
        news: Arc<dyn StorySource>,
        weather: Arc<dyn WeatherSource>,
    ) -> Self {
        Self {
            config,
            secrets,
            cache_factory,
            news,
            weather,
            invocations: AtomicU64::new(0),
        }
    }

    /// Run one invocation and return its response as JSON.
    pub async fn invoke(&self, function: Function, event: Value) -> Value {
        let request = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        let span = info_span!("invoke", function = function.name(), request);

        async {
            info!("Received event: {event}");
            match function {
                Function::News => to_json(&self.run_news().await),
                Function::Weather => match serde_json::from_value::<WeatherEvent>(event) {
                    Ok(event) => to_json(&self.run_weather(&event).await),
                    Err(e) => to_json(&Response::<()>::error(400, format!("invalid event: {e}"))),
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn run_news(&self) -> Response<Vec<Story>> {
        let cache = self.cache_factory.create(self.config.news_ttl).await;
        NewsHandler {
            source: self.news.as_ref(),
            cache_name: &self.config.cache_name,
            limit: self.config.top_stories,
        }
        .handle(&cache)
        .await
    }

    async fn run_weather(&self, event: &WeatherEvent) -> Response<WeatherSnapshot> {
        // Reject before the cache credential is fetched.
        if event.location().is_none() {
            return Response::error(400, LOCATION_REQUIRED);
        }

        let cache = self.cache_factory.create(self.config.weather_ttl).await;
        WeatherHandler {
            source: self.weather.as_ref(),
            secrets: &self.secrets,
            api_key_secret: &self.config.weather_secret,
            cache_name: &self.config.cache_name,
        }
        .handle(event, &cache)
        .await
    }

    /// Serve newline-delimited invocations until `reader` is exhausted.
    ///
    /// Each input line gets exactly one response line; unreadable lines get a 400.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Invocation>(&line) {
                Ok(invocation) => self.invoke(invocation.function, invocation.event).await,
                Err(e) => {
                    error!("Rejected invocation: {e}");
                    to_json(&Response::<()>::error(400, format!("invalid invocation: {e}")))
                }
            };

            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
        Ok(())
    }
}

fn to_json<T: Serialize>(response: &Response<T>) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| {
        error!("Could not serialize response: {e}");
        json!({ "statusCode": 500, "body": { "error": UNEXPECTED_ERROR } })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmallTalkError;
    use crate::secrets::provider::tests::FakeSecretStore;
    use crate::weather::Coordinates;
    use async_trait::async_trait;

    struct StaticPage;

    #[async_trait]
    impl StorySource for StaticPage {
        async fn front_page(&self) -> Result<String> {
            Ok(r#"<table><tr class="athing"><td><span class="titleline"><a href="/item?id=9">Nine</a></span></td></tr>
<tr><td><span class="score">9 points</span> <a class="hnuser">nine</a> <a>9&nbsp;comments</a></td></tr></table>"#
                .to_string())
        }
    }

    struct Offline;

    #[async_trait]
    impl WeatherSource for Offline {
        async fn geocode(&self, _location: &str, _api_key: &str) -> Result<Coordinates> {
            Err(SmallTalkError::Upstream {
                service: "OpenWeatherMap",
                status: 503,
            })
        }

        async fn current(&self, _coordinates: Coordinates, _api_key: &str) -> Result<Value> {
            unreachable!("geocode always fails")
        }
    }

    fn app(store: Arc<FakeSecretStore>) -> App {
        let secrets = Arc::new(SecretProvider::new(store));
        let connector: Arc<dyn CacheConnector> = Arc::new(MemoryConnector::default());
        let factory = CacheClientFactory::new(secrets.clone(), connector, "momento-api-key");
        App::from_parts(
            Config::default(),
            secrets,
            factory,
            Arc::new(StaticPage),
            Arc::new(Offline),
        )
    }

    #[tokio::test]
    async fn test_invoke_news() {
        let app = app(Arc::new(FakeSecretStore::default()));

        let response = app.invoke(Function::News, json!({})).await;

        assert_eq!(response["statusCode"], 200);
        assert_eq!(
            response["body"][0],
            json!({
                "title": "Nine",
                "link": "https://news.ycombinator.com/item?id=9",
                "author": "nine",
                "points": 9,
                "comments": 9,
            })
        );
    }

    #[tokio::test]
    async fn test_invoke_weather_upstream_failure() {
        let store = Arc::new(FakeSecretStore::with(&[("smalltalk-weather", "k")]));
        let app = app(store);

        let response = app
            .invoke(Function::Weather, json!({"body": {"location": "Seattle"}}))
            .await;

        assert_eq!(
            response,
            json!({"statusCode": 500, "body": {"error": "Failed to fetch weather data"}})
        );
    }

    #[tokio::test]
    async fn test_invoke_weather_rejects_non_object_event() {
        let app = app(Arc::new(FakeSecretStore::default()));

        let response = app.invoke(Function::Weather, json!([1, 2])).await;
        assert_eq!(response["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_serve_answers_every_line() {
        let app = app(Arc::new(FakeSecretStore::default()));
        let input = concat!(
            r#"{"function": "news"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"function": "hacker-news", "event": {}}"#,
            "\n",
            r#"{"function": "weather", "event": {"body": {}}}"#,
            "\n",
        );
        let mut output = Vec::new();

        app.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let statuses: Vec<u64> = responses
            .iter()
            .map(|r| r["statusCode"].as_u64().unwrap())
            .collect();
        assert_eq!(statuses, [200, 400, 200, 400]);
        assert_eq!(responses[0], responses[2]);
    }

    #[tokio::test]
    async fn test_blank_location_skips_cache_credential() {
        let store = Arc::new(FakeSecretStore::with(&[("momento-api-key", "k")]));
        let secrets = Arc::new(SecretProvider::new(store.clone()));
        let connector: Arc<dyn CacheConnector> =
            Arc::new(MomentoConnector::new(Client::new(), Some("http://127.0.0.1:9".into())));
        let factory = CacheClientFactory::new(secrets.clone(), connector, "momento-api-key");
        let app = App::from_parts(
            Config::default(),
            secrets,
            factory,
            Arc::new(StaticPage),
            Arc::new(Offline),
        );

        let response = app
            .invoke(Function::Weather, json!({"body": {"location": "  "}}))
            .await;

        assert_eq!(
            response,
            json!({"statusCode": 400, "body": {"error": "location is required"}})
        );
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn test_function_names() {
        let invocation: Invocation =
            serde_json::from_value(json!({"function": "weather"})).unwrap();
        assert_eq!(invocation.function, Function::Weather);
        assert_eq!(invocation.event, Value::Null);
        assert_eq!(Function::News.name(), "news");
    }
}
