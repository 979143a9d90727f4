//! # 処方フォームと受付窓口
//!
//! ダッシュボードの処方作成モーダルに相当する。
//! `PrescriptionDesk` はフォーム・処理中フラグ・`Minter` を保持し、
//! 同時に実行できるミント試行を1つに制限する。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use rx_types::{DraftUpdate, Patient, PrescriptionDraft, PrescriptionFields, ReceiptView};
use tokio::sync::Mutex;

use crate::error::{DeskError, MintError};
use crate::mint::{MintSuccess, Minter};
use crate::receipt::build_receipt;
use crate::wallet::Wallet;

/// 用量スライダーの最小値 (mg)
pub const AMOUNT_MIN_MG: u32 = 0;
/// 用量スライダーの最大値 (mg)
pub const AMOUNT_MAX_MG: u32 = 1000;
/// 用量スライダーの刻み (mg)
pub const AMOUNT_STEP_MG: u32 = 10;
/// 用量の初期値 (mg)
pub const DEFAULT_AMOUNT_MG: u32 = 50;

/// 処方作成フォーム。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionForm {
    patient_name: String,
    patient_id: String,
    medication: String,
    amount_mg: u32,
    notes: String,
}

impl Default for PrescriptionForm {
    fn default() -> Self {
        Self {
            patient_name: String::new(),
            patient_id: String::new(),
            medication: String::new(),
            amount_mg: DEFAULT_AMOUNT_MG,
            notes: String::new(),
        }
    }
}

/// スライダーの範囲と刻みに合わせる。
fn snap_amount(amount_mg: u32) -> u32 {
    let clamped = amount_mg.clamp(AMOUNT_MIN_MG, AMOUNT_MAX_MG);
    (clamped + AMOUNT_STEP_MG / 2) / AMOUNT_STEP_MG * AMOUNT_STEP_MG
}

impl PrescriptionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount_mg(&self) -> u32 {
        self.amount_mg
    }

    pub fn set_amount(&mut self, amount_mg: u32) {
        self.amount_mg = snap_amount(amount_mg);
    }

    /// 指定された項目だけを更新する。
    pub fn apply(&mut self, update: DraftUpdate) {
        if let Some(patient_name) = update.patient_name {
            self.patient_name = patient_name;
        }
        if let Some(patient_id) = update.patient_id {
            self.patient_id = patient_id;
        }
        if let Some(medication) = update.medication {
            self.medication = medication;
        }
        if let Some(amount_mg) = update.amount_mg {
            self.set_amount(amount_mg);
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
    }

    /// 患者を選択し、氏名とIDを入力する。
    pub fn select_patient(&mut self, patient: &Patient) {
        self.patient_name = patient.name.clone();
        self.patient_id = patient.id.clone();
    }

    /// 入力を初期状態に戻す。
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 表示用の用量（例: `200mg`）
    pub fn dosage(&self) -> String {
        format!("{}mg", self.amount_mg)
    }

    /// 署名対象のフィールド。値はトリム等を行わずそのまま使う。
    pub fn fields(&self) -> PrescriptionFields {
        PrescriptionFields {
            medication: self.medication.clone(),
            dosage: self.dosage(),
            instructions: self.notes.clone(),
        }
    }

    pub fn to_draft(&self) -> PrescriptionDraft {
        PrescriptionDraft {
            patient_name: self.patient_name.clone(),
            patient_id: self.patient_id.clone(),
            medication: self.medication.clone(),
            amount_mg: self.amount_mg,
            notes: self.notes.clone(),
        }
    }

    /// 必須項目（患者名・薬剤・指示）のうち空のもの
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.patient_name.is_empty() {
            missing.push("patient_name");
        }
        if self.medication.is_empty() {
            missing.push("medication");
        }
        if self.notes.is_empty() {
            missing.push("notes");
        }
        missing
    }
}

/// 成功したミント試行の結果。
#[derive(Debug, Clone)]
pub struct MintedPrescription {
    pub success: MintSuccess,
    pub receipt: ReceiptView,
}

/// 処理中フラグのガード。ドロップで解放する。
struct BusyGuard {
    inner: Arc<DeskInner>,
}

impl BusyGuard {
    fn acquire(inner: &Arc<DeskInner>) -> Option<Self> {
        inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                inner: inner.clone(),
            })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.busy.store(false, Ordering::Release);
    }
}

struct DeskInner {
    form: Mutex<PrescriptionForm>,
    busy: AtomicBool,
    minter: Minter,
    wallet: Option<Arc<dyn Wallet>>,
}

impl DeskInner {
    async fn attempt(&self) -> Result<MintedPrescription, MintError> {
        let form = self.form.lock().await.clone();
        let fields = form.fields();
        let success = self
            .minter
            .mint_checked(self.wallet.as_deref(), &fields, &form.missing_fields())
            .await?;
        let receipt = build_receipt(success.token_id, &form.to_draft(), &fields, &Local::now());

        self.form.lock().await.reset();
        Ok(MintedPrescription { success, receipt })
    }
}

/// 処方受付窓口。
pub struct PrescriptionDesk {
    inner: Arc<DeskInner>,
}

impl PrescriptionDesk {
    pub fn new(minter: Minter, wallet: Option<Arc<dyn Wallet>>) -> Self {
        Self {
            inner: Arc::new(DeskInner {
                form: Mutex::new(PrescriptionForm::default()),
                busy: AtomicBool::new(false),
                minter,
                wallet,
            }),
        }
    }

    pub fn minter(&self) -> &Minter {
        &self.inner.minter
    }

    pub fn wallet(&self) -> Option<&dyn Wallet> {
        self.inner.wallet.as_deref()
    }

    /// ミント試行が進行中か
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// フォームの現在の内容
    pub async fn form(&self) -> PrescriptionForm {
        self.inner.form.lock().await.clone()
    }

    pub async fn update_form(&self, update: DraftUpdate) -> PrescriptionForm {
        let mut form = self.inner.form.lock().await;
        form.apply(update);
        form.clone()
    }

    pub async fn select_patient(&self, patient: &Patient) -> PrescriptionForm {
        let mut form = self.inner.form.lock().await;
        form.select_patient(patient);
        form.clone()
    }

    /// フォームを閉じる（入力を破棄する）。
    pub async fn reset_form(&self) -> PrescriptionForm {
        let mut form = self.inner.form.lock().await;
        form.reset();
        form.clone()
    }

    /// フォームの内容で処方をミントする。
    ///
    /// 成功時はフォームを初期化してレシートを返す。失敗時は入力を保持する。
    /// 別の試行が進行中なら `AttemptInProgress`。
    ///
    /// 試行は別タスクで実行される。呼び出し側がドロップされても
    /// 試行は終端状態まで進み、その間の再送信は拒否される。
    pub async fn submit(&self) -> Result<MintedPrescription, DeskError> {
        let busy = BusyGuard::acquire(&self.inner).ok_or(DeskError::AttemptInProgress)?;

        let inner = self.inner.clone();
        let attempt = tokio::spawn(async move {
            let _busy = busy;
            inner.attempt().await
        });

        let minted = attempt
            .await
            .map_err(|e| MintError::Unknown(format!("ミント処理が中断されました: {e}")))??;
        Ok(minted)
    }
}
