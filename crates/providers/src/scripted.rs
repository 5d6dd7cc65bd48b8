//! Scripted gateway — deterministic fallback when no API key is configured.
//!
//! Replays a canned itinerary as a fragment stream. This is a conformance
//! fixture, not flavor text: the script contains real product markers and
//! the default fragmentation cuts them mid-marker, so every consumer is
//! exercised against the same boundary hazards the live gateway produces.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use itinera_core::{
    ClassificationError, Classifier, CompletionGateway, FragmentReceiver, StreamError, Verdict,
};

/// The canned three-day itinerary, markers included.
pub const SCRIPTED_ITINERARY: &str = "## 三日游行程安排：

### 第一天：东京市区观光
- 上午：抵达羽田机场后，建议选择我们的机场接送服务，7座埃尔法豪华体验

[PRODUCT:LINKTIVITY-2IV2I]

- 下午：前往东京晴空塔，推荐超值套票，包含展望台门票和地铁24小时通票

[PRODUCT:LINKTIVITY-3PWVV]

### 第二天：传统文化体验
- 晚上：在新宿欣赏精彩的忍者&歌舞伎表演，体验日本传统文化的现代演绎

[PRODUCT:Ninja-Kabuki-Tokyo]

### 第三天：夜景巡航
- 夜晚：乘坐东京双塔水上巴士夜间巡航，欣赏隅田川和东京湾的璀璨夜景

[PRODUCT:LINKTIVITY-RHT5G]

## 总预算：约¥15,200

这个行程安排让您既能体验东京的现代魅力，又能感受传统文化的底蕴，相信会给您留下难忘的回忆！";

/// Characters per fragment in the default script. Small enough that every
/// marker in the script straddles several fragment boundaries.
const DEFAULT_FRAGMENT_CHARS: usize = 5;

/// Deterministic fragment-replay gateway.
pub struct ScriptedGateway {
    fragments: Vec<String>,
    delay: Duration,
}

impl ScriptedGateway {
    /// The default script: the canned itinerary cut into marker-straddling
    /// fragments.
    pub fn itinerary() -> Self {
        Self::from_text(SCRIPTED_ITINERARY, DEFAULT_FRAGMENT_CHARS)
    }

    /// Cut arbitrary text into fragments of `chars` characters each.
    pub fn from_text(text: &str, chars: usize) -> Self {
        let chars = chars.max(1);
        let mut fragments = Vec::new();
        let mut current = String::new();
        for ch in text.chars() {
            current.push(ch);
            if current.chars().count() == chars {
                fragments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            fragments.push(current);
        }
        Self {
            fragments,
            delay: Duration::from_millis(15),
        }
    }

    /// Replay an explicit fragment sequence (tests).
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        Self {
            fragments,
            delay: Duration::ZERO,
        }
    }

    /// Pause between fragments (simulated generation latency).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

#[async_trait]
impl Classifier for ScriptedGateway {
    async fn classify(&self, _query: &str) -> Result<Verdict, ClassificationError> {
        // Offline mode has no judge; every query proceeds.
        Ok(Verdict::Accepted)
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn stream_complete(&self, _prompt: &str) -> Result<FragmentReceiver, StreamError> {
        info!(fragments = self.fragments.len(), "Replaying scripted completion");

        let (tx, rx) = mpsc::channel(64);
        let fragments = self.fragments.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            for fragment in fragments {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(Ok(fragment)).await.is_err() {
                    // Receiver dropped — the turn was aborted.
                    return;
                }
            }
        });

        Ok(rx)
    }
}
