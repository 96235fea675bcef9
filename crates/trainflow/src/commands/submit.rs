//! 保存済みの実行設定でジョブを送信

use crate::SubmitArgs;
use colored::Colorize;
use trainflow_cloud_azure::{AzCli, AzureError, SubmitConfig};
use trainflow_core::{CoreError, RunConfigStore};

pub async fn handle(args: SubmitArgs) -> anyhow::Result<()> {
    let az = AzCli::new(args.subscription.clone());

    match az.check_auth().await {
        Ok(_) => {}
        Err(e @ (AzureError::AzNotFound | AzureError::NotLoggedIn)) => {
            println!("{} {}", "⚠".yellow(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let project_root = trainflow_core::find_project_root()?;
    let store = RunConfigStore::new(&project_root);

    let config = match store.load(&args.compute_target).await {
        Ok(config) => config,
        Err(e @ CoreError::RunConfigNotFound(_)) => {
            println!("{} {}", "⚠".yellow(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "{}",
        format!("実験 '{}' にジョブを送信中...", config.experiment)
            .blue()
            .bold()
    );
    println!("  スクリプト: {}", config.script);
    println!("  環境: {}", config.environment);
    if let Some(ref dataset_id) = config.dataset_id {
        println!("  データセット: {}", dataset_id);
    }

    let run = az
        .submit_run(&SubmitConfig {
            resource_group: args.resource_group.clone(),
            workspace: args.workspace.clone(),
            experiment: config.experiment.clone(),
            runconfig_file: store.path_for(&args.compute_target),
            script: config.script.clone(),
        })
        .await?;

    println!();
    println!("  ✓ 送信完了: {}", run.run_id.green().bold());
    if let Some(url) = run.web_portal_url {
        println!("    {}", url.dimmed());
    }

    Ok(())
}
