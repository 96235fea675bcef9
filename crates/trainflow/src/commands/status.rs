//! リソースチェーンの状態表示
//!
//! 発見のみを行い、何も作成しません。親リソースが存在しない場合、
//! それ以降のチェックはスキップされます。

use crate::StatusArgs;
use colored::Colorize;
use trainflow_cloud_azure::{AzCli, AzureError};
use trainflow_core::RunConfigStore;

pub async fn handle(args: StatusArgs) -> anyhow::Result<()> {
    let az = AzCli::new(args.subscription.clone());

    match az.check_auth().await {
        Ok(_) => {}
        Err(e @ (AzureError::AzNotFound | AzureError::NotLoggedIn)) => {
            println!("{} {}", "⚠".yellow(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    println!("{}", "リソースチェーンの状態:".blue().bold());

    // リソースグループ
    let group = az.get_group(&args.resource_group).await?;
    match &group {
        Some(group) => {
            println!(
                "  {} リソースグループ '{}' ({})",
                "✓".green(),
                group.name.cyan(),
                group.location
            );
        }
        None => {
            println!(
                "  {} リソースグループ '{}' は存在しません",
                "✗".red(),
                args.resource_group
            );
            print_runconfig_status(&args)?;
            return Ok(());
        }
    }

    // ワークスペース
    let Some(ref workspace_name) = args.workspace else {
        print_runconfig_status(&args)?;
        return Ok(());
    };

    let workspace = az
        .get_workspace(&args.resource_group, workspace_name)
        .await?;
    match &workspace {
        Some(workspace) => {
            println!(
                "  {} ワークスペース '{}'",
                "✓".green(),
                workspace.name.cyan()
            );
        }
        None => {
            println!(
                "  {} ワークスペース '{}' は存在しません",
                "✗".red(),
                workspace_name
            );
            print_runconfig_status(&args)?;
            return Ok(());
        }
    }

    // コンピュートターゲット
    if let Some(ref compute_name) = args.compute_target {
        match az
            .get_compute_target(&args.resource_group, workspace_name, compute_name)
            .await?
        {
            Some(target) => {
                let state = target.provisioning_state.as_deref().unwrap_or("Unknown");
                let state_colored = if target.is_ready() {
                    state.green()
                } else {
                    state.yellow()
                };
                println!(
                    "  {} コンピュートターゲット '{}' - {}",
                    "✓".green(),
                    target.name.cyan(),
                    state_colored
                );
            }
            None => {
                println!(
                    "  {} コンピュートターゲット '{}' は存在しません",
                    "✗".red(),
                    compute_name
                );
            }
        }
    }

    // データセット
    if let Some(ref dataset_name) = args.dataset_name {
        match az
            .get_dataset(&args.resource_group, workspace_name, dataset_name)
            .await?
        {
            Some(dataset) => {
                println!(
                    "  {} データセット '{}' (ID: {})",
                    "✓".green(),
                    dataset.name.cyan(),
                    dataset.id
                );
            }
            None => {
                println!(
                    "  {} データセット '{}' は未登録です",
                    "✗".red(),
                    dataset_name
                );
            }
        }
    }

    // 環境
    let environments = az
        .list_environments(&args.resource_group, workspace_name)
        .await?;
    println!(
        "  {} 登録済み環境: {} 件",
        "•".cyan(),
        environments.len()
    );

    print_runconfig_status(&args)?;
    Ok(())
}

/// ローカルの実行設定ファイルの有無を表示
fn print_runconfig_status(args: &StatusArgs) -> anyhow::Result<()> {
    let Some(ref compute_name) = args.compute_target else {
        return Ok(());
    };

    let project_root = trainflow_core::find_project_root()?;
    let store = RunConfigStore::new(&project_root);

    if store.exists(compute_name) {
        println!(
            "  {} 実行設定: {}",
            "✓".green(),
            store.path_for(compute_name).display().to_string().cyan()
        );
    } else {
        println!(
            "  {} 実行設定はまだ作成されていません ('train up' で作成)",
            "✗".red()
        );
    }

    Ok(())
}
