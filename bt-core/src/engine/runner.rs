//! Backtest Runner — drives a `BarProcessor` to completion over a bar
//! source. The sync form takes an iterator; the async forms take a
//! `BarSource` (async-trait, request/response) or a `futures::Stream`.
//! Strategy callbacks stay synchronous either way — only the producer
//! awaits (SPEC_FULL.md §4.4, §5).

use crate::domain::Bar;
use crate::engine::config::EngineConfig;
use crate::engine::processor::BarProcessor;
use crate::engine::strategy::Strategy;
use crate::error::EngineError;
use crate::sizing::PositionSizer;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// An asynchronous bar feed: a market data client, a websocket replay, a
/// paginated historical API. One `next` call per bar.
#[async_trait]
pub trait BarSource {
    async fn next(&mut self) -> Result<Option<Bar>, EngineError>;
}

pub struct BacktestRunner<S: Strategy> {
    processor: BarProcessor,
    strategy: S,
}

impl<S: Strategy> BacktestRunner<S> {
    pub fn new(config: &EngineConfig, sizer: Box<dyn PositionSizer>, mut strategy: S) -> Result<Self, EngineError> {
        strategy.configure(config)?;
        Ok(Self {
            processor: BarProcessor::new(config, sizer),
            strategy,
        })
    }

    pub fn processor(&self) -> &BarProcessor {
        &self.processor
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Drive the run to completion over an in-memory or lazily-produced
    /// synchronous bar sequence.
    pub fn run(&mut self, bars: impl IntoIterator<Item = Bar>) -> Result<(), EngineError> {
        for bar in bars {
            self.processor.process_bar(&mut self.strategy, &bar)?;
        }
        Ok(())
    }

    /// Drive the run against an asynchronous bar source. Each bar is
    /// awaited individually; `process_bar` itself runs synchronously.
    pub async fn run_async(&mut self, source: &mut dyn BarSource) -> Result<(), EngineError> {
        while let Some(bar) = source.next().await? {
            self.processor.process_bar(&mut self.strategy, &bar)?;
        }
        Ok(())
    }

    /// Drive the run against a `futures::Stream` of bars, e.g. one backed
    /// by a channel feeding live ticks or a chunked file reader.
    pub async fn run_async_stream(
        &mut self,
        mut stream: Pin<Box<dyn Stream<Item = Result<Bar, EngineError>> + Send>>,
    ) -> Result<(), EngineError> {
        use futures::StreamExt;
        while let Some(bar) = stream.next().await {
            self.processor.process_bar(&mut self.strategy, &bar?)?;
        }
        Ok(())
    }
}
