use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::{json, Value};
use std::sync::Arc;

use continuum_nodes::continuum::config::ConfigLoader;
use continuum_nodes::continuum::registry::NodeRegistry;
use continuum_nodes::continuum::workflow::{WorkflowGraph, WorkflowLoader};
use continuum_nodes::runtime::{ChannelHost, ExecutionContext, HostEvent, NodeOutput};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a pack config file (defaults to $CONTINUUM_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered nodes
    List,
    /// Execute a single node
    Run {
        /// Node class name, e.g. StepSlider
        #[arg(short, long)]
        node: String,

        /// Node inputs as a JSON object
        #[arg(short, long, default_value = "{}")]
        inputs: String,

        /// Workflow JSON passed to the node as extra_pnginfo
        #[arg(short, long)]
        workflow: Option<String>,

        /// Id of the node inside the workflow
        #[arg(short, long)]
        unique_id: Option<String>,
    },
    /// Show the nodes fed by a node's first output, grouped by mode
    Inspect {
        /// Workflow JSON file
        #[arg(short, long)]
        workflow: String,

        /// Node id inside the workflow
        #[arg(short, long)]
        node: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = ConfigLoader::resolve(args.config.as_deref())?;

    match args.command {
        Commands::List => {
            let registry = NodeRegistry::with_builtin_nodes(&config).await;
            for info in registry.list().await {
                println!(
                    "{:<28} {:<28} {}",
                    info.class_name, info.display_name, info.category
                );
            }
        }
        Commands::Run {
            node,
            inputs,
            workflow,
            unique_id,
        } => {
            let registry = NodeRegistry::with_builtin_nodes(&config).await;
            let inputs: Value =
                serde_json::from_str(&inputs).context("--inputs must be a JSON object")?;

            let (host, mut events) = ChannelHost::new();
            let mut ctx = ExecutionContext::new(Arc::new(host));
            if let Some(id) = unique_id {
                ctx = ctx.with_unique_id(id);
            }
            if let Some(path) = workflow {
                let workflow = WorkflowLoader::new()
                    .load_value(&path)
                    .with_context(|| format!("failed to load workflow {}", path))?;
                let extra_pnginfo = json!({ "workflow": workflow });
                ctx = ctx
                    .with_prompt(json!({ "extra_data": { "extra_pnginfo": extra_pnginfo.clone() } }))
                    .with_extra_pnginfo(extra_pnginfo);
            }

            match registry.execute(&node, inputs, &ctx).await? {
                NodeOutput::Blocked => println!("BLOCKED"),
                NodeOutput::Values(values) => {
                    for (i, value) in values.iter().enumerate() {
                        println!("output[{}]: {}", i, value);
                    }
                }
            }

            while let Ok(event) = events.try_recv() {
                match event {
                    HostEvent::Notification { event, payload } => {
                        println!("event {}: {}", event, payload)
                    }
                    HostEvent::InterruptProcessing => println!("interrupt processing"),
                }
            }
        }
        Commands::Inspect { workflow, node } => {
            let value = WorkflowLoader::new()
                .load_value(&workflow)
                .with_context(|| format!("failed to load workflow {}", workflow))?;
            let graph = WorkflowGraph::from_value(&value)?;
            let partition = graph.partition(&node)?;
            if partition.is_empty() {
                println!("Node {} has no switchable downstream nodes", node);
            } else {
                println!("{}", serde_json::to_string_pretty(&partition)?);
            }
        }
    }

    Ok(())
}
