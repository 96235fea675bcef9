//! プロビジョニングウォークスルー
//!
//! リソースグループ → ワークスペース → コンピュートターゲット →
//! データセット → 環境 の順にステップゲートを通し、すべて解決できたら
//! 実行設定を書き出します。

use crate::UpArgs;
use crate::confirm::TerminalConfirm;
use colored::Colorize;
use std::sync::Arc;
use trainflow_cloud::{
    AssumeYes, Confirm, EnvironmentQuery, HaltReason, ProvisionContext, ProvisionStep, StepOutcome,
    run_step,
};
use trainflow_cloud_azure::{
    AzCli, AzureError, ComputeTargetStep, DatasetSelector, DatasetStep, EnvironmentStep,
    ResourceGroupStep, SubmitConfig, WorkspaceStep,
};
use trainflow_core::{Materialized, RunConfig, RunConfigStore};

pub async fn handle(args: UpArgs) -> anyhow::Result<()> {
    // 環境の指定は必須の組み合わせ（どちらか一方）
    let env_query = match (&args.environment, &args.environment_match) {
        (Some(name), None) => EnvironmentQuery::Exact(name.clone()),
        (None, Some(fragment)) => EnvironmentQuery::Fuzzy(fragment.clone()),
        (None, None) => {
            println!("{}", "環境が指定されていません。".yellow().bold());
            println!("  --environment <名前>              完全一致で選択");
            println!("  --environment-match <部分文字列>  最新バージョンを選択");
            println!("のいずれかを指定してください。");
            return Ok(());
        }
        (Some(_), Some(_)) => {
            unreachable!("clap group rejects both environment flags");
        }
    };

    // az CLIと認証の確認
    println!("{}", "Azure CLIを確認中...".blue());
    let az = Arc::new(AzCli::new(args.subscription.clone()));
    let account = match az.check_auth().await {
        Ok(account) => account,
        Err(e @ (AzureError::AzNotFound | AzureError::NotLoggedIn)) => {
            println!("  {} {}", "⚠".yellow(), e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!("  ✓ アカウント: {} ({})", account.name.cyan(), account.id);

    let confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm)
    };

    // ステップ列の組み立て
    let mut steps: Vec<Box<dyn ProvisionStep>> = vec![
        Box::new(ResourceGroupStep::new(
            az.clone(),
            &args.resource_group,
            &args.location,
        )),
        Box::new(WorkspaceStep::new(az.clone(), &args.workspace)),
        Box::new(ComputeTargetStep::new(
            az.clone(),
            &args.compute_target,
            &args.vm_size,
            args.max_nodes,
        )),
    ];

    // データセットは選択されたときだけ鎖に加わる（意図的なスキップ）
    match dataset_selector(&args) {
        Some(selector) => {
            steps.push(Box::new(DatasetStep::new(az.clone(), selector)));
        }
        None => {
            println!(
                "{}",
                "  データセット指定なし: データセットステップをスキップします".dimmed()
            );
        }
    }

    steps.push(Box::new(EnvironmentStep::new(az.clone(), env_query)));

    let mut ctx = ProvisionContext::new().with_experiment(&args.experiment);
    if let Some(ref subscription) = args.subscription {
        ctx = ctx.with_subscription(subscription);
    }

    println!();
    println!(
        "{}",
        format!(
            "プロビジョニングを開始します (ワークスペース: {})",
            args.workspace
        )
        .blue()
        .bold()
    );

    for step in &steps {
        println!();
        println!("  {} {}", "▶".green(), step.name().cyan().bold());

        match run_step(step.as_ref(), &ctx, confirm.as_ref()).await? {
            StepOutcome::Found(next) => {
                ctx = next;
                println!("    ✓ 既存のリソースを使用します");
            }
            StepOutcome::Created(next) => {
                ctx = next;
                println!("    ✓ 作成完了");
            }
            StepOutcome::Halt(reason) => {
                print_halt(step.name(), &reason);
                return Ok(());
            }
        }
    }

    // 実行設定の具現化
    println!();
    println!("{}", "実行設定を作成中...".blue());

    let project_root = trainflow_core::find_project_root()?;
    let store = RunConfigStore::new(&project_root);

    // 既存ファイルは明示的な確認がない限りそのまま再利用する
    let regenerate = if store.exists(&args.compute_target) {
        args.regenerate
            && confirm.confirm(&format!(
                "既存の実行設定 {} を作り直しますか？",
                store.path_for(&args.compute_target).display()
            ))?
    } else {
        false
    };

    let environment = ctx
        .environment
        .clone()
        .ok_or_else(|| anyhow::anyhow!("環境が解決されていません"))?;

    let config = RunConfig {
        script: args.script.clone(),
        compute_target: args.compute_target.clone(),
        environment,
        dataset_id: ctx.dataset_id.clone(),
        experiment: args.experiment.clone(),
        created_at: chrono::Utc::now(),
    };

    let materialized = store.materialize(&config, regenerate).await?;
    let effective = match &materialized {
        Materialized::Written(path) => {
            println!(
                "  ✓ 書き出しました: {}",
                path.display().to_string().cyan()
            );
            config
        }
        Materialized::Reused(path, existing) => {
            println!(
                "  ✓ 既存の実行設定を再利用します: {}",
                path.display().to_string().cyan()
            );
            existing.clone()
        }
    };

    // ジョブ送信
    if args.submit {
        println!();
        println!(
            "{}",
            format!("実験 '{}' にジョブを送信中...", effective.experiment).blue()
        );

        let run = az
            .submit_run(&SubmitConfig {
                resource_group: args.resource_group.clone(),
                workspace: args.workspace.clone(),
                experiment: effective.experiment.clone(),
                runconfig_file: store.path_for(&args.compute_target),
                script: effective.script.clone(),
            })
            .await?;

        println!("  ✓ 送信完了: {}", run.run_id.green().bold());
        if let Some(url) = run.web_portal_url {
            println!("    {}", url.dimmed());
        }
    } else {
        println!();
        println!("{}", "✓ ウォークスルーが完了しました！".green().bold());
        println!("{}", "ジョブを送信するには:".bold());
        println!(
            "  {} submit -g {} -w {} -c {}",
            "train".cyan(),
            args.resource_group,
            args.workspace,
            args.compute_target
        );
    }

    Ok(())
}

/// データセットの選択方法を決定（フラグは相互排他）
fn dataset_selector(args: &UpArgs) -> Option<DatasetSelector> {
    if let Some(ref id) = args.dataset_id {
        Some(DatasetSelector::Id(id.clone()))
    } else if let Some(ref name) = args.dataset_name {
        Some(DatasetSelector::Name(name.clone()))
    } else {
        args.dataset_file.clone().map(DatasetSelector::File)
    }
}

/// ハルト理由を案内として表示（正常終了）
fn print_halt(step: &str, reason: &HaltReason) {
    println!();
    match reason {
        HaltReason::MissingPrerequisite(missing) => {
            println!(
                "{}",
                format!("⚠ ステップ '{}' の前提が満たされていません", step)
                    .yellow()
                    .bold()
            );
            println!("  不足しているパラメータ: {}", missing.join(", "));
        }
        HaltReason::Declined => {
            println!(
                "{}",
                format!("⚠ ステップ '{}' をキャンセルしました", step)
                    .yellow()
                    .bold()
            );
            println!("  作成済みのリソースはそのまま残ります。再実行すると続きから再開できます。");
        }
        HaltReason::NotFound => {
            println!(
                "{}",
                format!("⚠ ステップ '{}' のリソースが見つかりません", step)
                    .yellow()
                    .bold()
            );
            println!("  このステップでは作成できないリソースです。名前を確認してください。");
        }
    }
}
