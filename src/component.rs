//! The pipeline-facing component: one inbound batch in, one rendered
//! document out.

use crate::binder::Bindings;
use crate::config::{FormatterSettings, RepeatScope};
use crate::error::FormatterError;
use crate::message::{ComponentStatistics, Message, MessageTarget, TextMessage};
use crate::model::Model;
use crate::render::RenderPass;
use log::info;
use xmlflow_dom::Document;

pub struct XmlFormatter {
    settings: FormatterSettings,
    model: Model,
    template: Document,
    bindings: Bindings,
    /// Per-entity "anchor populated in place" flags. Their lifetime follows
    /// [`RepeatScope`]; committed only after a successful render so a failed
    /// message leaves no trace.
    applied: Vec<bool>,
    statistics: ComponentStatistics,
}

impl XmlFormatter {
    /// Parses the template and resolves all configured bindings. Any
    /// malformed template or path expression fails here, before the first
    /// message is accepted.
    pub fn start(settings: FormatterSettings, model: Model) -> Result<Self, FormatterError> {
        let mut template = Document::parse(&settings.template)?;
        let bindings = Bindings::bind(&mut template, &settings, &model)?;
        let applied = vec![false; bindings.entities.len()];
        Ok(XmlFormatter {
            settings,
            model,
            template,
            bindings,
            applied,
            statistics: ComponentStatistics::default(),
        })
    }

    /// Renders one inbound batch and sends exactly one outbound document.
    /// The outbound sequence number is the running count of documents this
    /// instance has emitted; the end-of-stream flag passes through.
    pub fn handle(
        &mut self,
        message: &Message,
        target: &mut impl MessageTarget,
    ) -> Result<(), FormatterError> {
        self.statistics.messages_received += 1;

        let mut applied = match self.settings.repeat_scope {
            RepeatScope::PerMessage => vec![false; self.bindings.entities.len()],
            RepeatScope::ComponentLifetime => self.applied.clone(),
        };
        let payload = RenderPass::new(&self.template, &self.bindings, &self.settings, &self.model)
            .render(&message.rows, &mut applied)?;
        self.applied = applied;

        info!("XML output: {payload}");

        self.statistics.messages_emitted += 1;
        target.send(TextMessage {
            sequence_number: self.statistics.messages_emitted,
            payload,
            end_of_stream: message.end_of_stream,
        });
        Ok(())
    }

    pub fn statistics(&self) -> ComponentStatistics {
        self.statistics
    }
}
