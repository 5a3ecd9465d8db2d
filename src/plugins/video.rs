//! The `video` command group.
//!
//! ```text
//! /video          usage help
//! /video 美女     fetch a random video
//! /video 随机     same as 美女
//! /video 状态     static configuration report, no network call
//! ```
//!
//! `小视频` and `短视频` are aliases of `video`.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::endpoints::VideoResult;
use crate::error::Result;
use crate::fetcher::{FallbackFetcher, HttpSource, VideoSource};
use crate::host::{CommandSpec, Component, MessageEvent, PluginMetadata, Star};

pub const PLUGIN_NAME: &str = "shortvid";
pub const PLUGIN_AUTHOR: &str = "cloudcranesss";
pub const PLUGIN_DESCRIPTION: &str = "随机短视频，多接口自动切换";
pub const PLUGIN_REPO: &str = "https://github.com/cloudcranesss/astrbot_plugin_game_videos";

pub const VIDEO_COMMAND: CommandSpec = CommandSpec {
    name: "video",
    aliases: &["小视频", "短视频"],
};

/// Acknowledgment sent before the fetch starts.
pub const WAIT_MESSAGE: &str = "正在获取视频，请稍候...";

/// Parsed `video` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCommand {
    /// No argument.
    Help,
    /// `美女` or `随机`.
    Fetch,
    /// `状态`.
    Status,
    /// Anything else.
    Unknown(String),
}

/// Parse the arguments that follow `video`.
pub fn parse_video_command(args: &str) -> VideoCommand {
    match args.split_whitespace().next() {
        None => VideoCommand::Help,
        Some("美女") | Some("随机") => VideoCommand::Fetch,
        Some("状态") => VideoCommand::Status,
        Some(other) => VideoCommand::Unknown(other.to_string()),
    }
}

/// Usage text for the command group.
pub fn format_help() -> String {
    [
        "🎬 短视频插件使用说明",
        "/video 美女 - 随机获取一个美女视频",
        "/video 随机 - 同上",
        "/video 状态 - 查看插件状态",
    ]
    .join("\n")
}

/// Caption shown under a fetched video.
pub fn format_caption(video: &VideoResult) -> String {
    format!("🎬 {}\n来源: {}", video.title, video.source.host())
}

/// A plugin that replies with a random short video.
pub struct VideoPlugin<S = HttpSource> {
    fetcher: FallbackFetcher<S>,
    timeout_secs: u64,
}

impl VideoPlugin<HttpSource> {
    /// Validate `config` and open the shared HTTP session.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let fetcher = FallbackFetcher::from_config(config)?;
        info!(
            endpoints = fetcher.endpoints().len(),
            max_retries = fetcher.max_retries(),
            timeout_secs = config.timeout_secs,
            "video plugin initialized"
        );
        Ok(Self::with_fetcher(fetcher, config.timeout_secs))
    }
}

impl<S: VideoSource> VideoPlugin<S> {
    pub fn with_fetcher(fetcher: FallbackFetcher<S>, timeout_secs: u64) -> Self {
        Self {
            fetcher,
            timeout_secs,
        }
    }

    pub fn fetcher(&self) -> &FallbackFetcher<S> {
        &self.fetcher
    }

    /// Static configuration report.
    pub fn format_status(&self) -> String {
        let session = if self.fetcher.is_open() {
            "已打开"
        } else {
            "已关闭"
        };
        format!(
            "📊 短视频插件状态\n接口数量: {}\n会话状态: {}\n重试次数: {}\n超时时间: {}秒",
            self.fetcher.endpoints().len(),
            session,
            self.fetcher.max_retries(),
            self.timeout_secs
        )
    }

    /// Run one `video` subcommand against `event`.
    pub async fn run(&self, args: &str, event: &dyn MessageEvent) -> Result<()> {
        match parse_video_command(args) {
            VideoCommand::Help => event.send(event.plain_result(&format_help())).await,
            VideoCommand::Status => event.send(event.plain_result(&self.format_status())).await,
            VideoCommand::Fetch => self.fetch_and_reply(event).await,
            VideoCommand::Unknown(sub) => {
                let text = format!("未知子命令：{}\n\n{}", sub, format_help());
                event.send(event.plain_result(&text)).await
            }
        }
    }

    async fn fetch_and_reply(&self, event: &dyn MessageEvent) -> Result<()> {
        event.send(event.plain_result(WAIT_MESSAGE)).await?;

        match self.fetcher.fetch_random_video().await {
            Ok(video) => {
                info!(url = %video.url, source = %video.source.url, "sending video");
                let caption = format_caption(&video);
                event
                    .send(event.chain_result(vec![
                        Component::video_from_url(video.url),
                        Component::plain(caption),
                    ]))
                    .await
            }
            Err(e) => {
                warn!(sender = event.sender_name(), "video fetch failed: {e}");
                event.send(event.plain_result(&e.user_message())).await
            }
        }
    }
}

#[async_trait]
impl<S: VideoSource> Star for VideoPlugin<S> {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME.to_string(),
            author: PLUGIN_AUTHOR.to_string(),
            description: PLUGIN_DESCRIPTION.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            repo: PLUGIN_REPO.to_string(),
        }
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![VIDEO_COMMAND]
    }

    async fn handle(&self, command: &str, args: &str, event: &dyn MessageEvent) -> Result<()> {
        if command != VIDEO_COMMAND.name {
            debug!(command, "ignoring unrelated command");
            return Ok(());
        }
        self.run(args, event).await
    }

    async fn terminate(&self) {
        if self.fetcher.close() {
            info!("video plugin terminated");
        }
    }
}
