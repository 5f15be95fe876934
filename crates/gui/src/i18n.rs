use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Lang {
    Ru,
    En,
}

static CURRENT_LANG: AtomicU8 = AtomicU8::new(0); // 0=Ru (default)

pub fn lang() -> Lang {
    match CURRENT_LANG.load(Ordering::Relaxed) {
        1 => Lang::En,
        _ => Lang::Ru,
    }
}

pub fn set_lang(l: Lang) {
    CURRENT_LANG.store(
        match l {
            Lang::Ru => 0,
            Lang::En => 1,
        },
        Ordering::Relaxed,
    );
}

/// Translate a key to the current language.
pub fn t(key: &str) -> &'static str {
    let ru = lang() == Lang::Ru;
    match key {
        // ── Main menus ──────────────────────────────────────
        "menu.file" => if ru { "Файл" } else { "File" },
        "menu.open_source" => if ru { "Открыть скрипт..." } else { "Open script..." },
        "menu.open_source_title" => if ru { "Открыть скрипт модели" } else { "Open model script" },
        "menu.save_source" => if ru { "Сохранить скрипт..." } else { "Save script..." },
        "menu.save_source_title" => if ru { "Сохранить скрипт модели" } else { "Save model script" },
        "menu.export_stl" => if ru { "Экспорт STL..." } else { "Export STL..." },
        "menu.export_stl_title" => if ru { "Экспорт STL" } else { "Export STL" },
        "menu.save_snapshot" => if ru { "Сохранить снимок PNG..." } else { "Save PNG snapshot..." },
        "menu.samples" => if ru { "Примеры" } else { "Samples" },
        "menu.quit" => if ru { "Выход" } else { "Quit" },

        "menu.view" => if ru { "Вид" } else { "View" },
        "menu.sketch_panel" => if ru { "Эскиз" } else { "Sketch" },
        "menu.parameters" => if ru { "Параметры" } else { "Parameters" },
        "menu.report" => if ru { "Печатаемость" } else { "Printability" },
        "menu.source" => if ru { "Исходный код" } else { "Source" },
        "menu.reset_camera" => if ru { "Сбросить камеру" } else { "Reset camera" },
        "menu.language" => if ru { "Язык" } else { "Language" },
        "menu.settings" => if ru { "Настройки..." } else { "Settings..." },

        // ── Sketch + prompt ─────────────────────────────────
        "sketch.title" => if ru { "Эскиз" } else { "Sketch" },
        "sketch.undo" => if ru { "Отменить штрих" } else { "Undo stroke" },
        "sketch.clear" => if ru { "Очистить" } else { "Clear" },
        "sketch.brush" => if ru { "Кисть" } else { "Brush" },
        "sketch.from_view" => if ru { "Взять вид модели" } else { "Trace current view" },
        "prompt.hint" => if ru { "Опишите деталь..." } else { "Describe the part..." },
        "prompt.generate" => if ru { "Сгенерировать" } else { "Generate" },
        "prompt.generating" => if ru { "Генерация..." } else { "Generating..." },
        "prompt.retry" => if ru { "Повторить" } else { "Retry" },

        // ── Parameters ──────────────────────────────────────
        "params.title" => if ru { "Параметры" } else { "Parameters" },
        "params.apply" => if ru { "Пересчитать" } else { "Rebuild" },
        "params.reset" => if ru { "По умолчанию" } else { "Defaults" },
        "params.none" => if ru { "Модель без параметров" } else { "The model has no parameters" },
        "params.formula_hint" => if ru { "Число или формула" } else { "Number or formula" },

        // ── Printability report ─────────────────────────────
        "report.title" => if ru { "Печатаемость" } else { "Printability" },
        "report.wall" => if ru { "Мин. толщина стенки" } else { "Min wall thickness" },
        "report.overhang" => if ru { "Макс. нависание" } else { "Max overhang" },
        "report.stability" => if ru { "Устойчивость" } else { "Stability" },
        "report.stable" => if ru { "устойчива" } else { "stable" },
        "report.unstable" => if ru { "неустойчива" } else { "unstable" },
        "report.printable" => if ru { "Можно печатать" } else { "Printable" },
        "report.not_printable" => if ru { "Есть проблемы" } else { "Needs attention" },
        "report.none" => if ru { "Нет модели" } else { "No model" },

        // ── Source editor ───────────────────────────────────
        "source.title" => if ru { "Исходный код" } else { "Source" },
        "source.run" => if ru { "Выполнить" } else { "Run" },

        // ── Error overlay ───────────────────────────────────
        "overlay.evaluation" => if ru { "Ошибка модели" } else { "Model error" },
        "overlay.export" => if ru { "Ошибка экспорта" } else { "Export error" },
        "overlay.snapshot" => if ru { "Ошибка снимка" } else { "Snapshot error" },
        "overlay.generation" => if ru { "Ошибка генерации" } else { "Generation error" },
        "overlay.dismiss" => if ru { "Закрыть" } else { "Dismiss" },
        "viewport.empty" => if ru { "Нарисуйте эскиз и нажмите «Сгенерировать»" } else { "Draw a sketch and press Generate" },

        // ── Status bar ──────────────────────────────────────
        "status.ready" => if ru { "Готово" } else { "Ready" },
        "status.solids" => if ru { "Тела" } else { "Solids" },
        "status.triangles" => if ru { "Треугольники" } else { "Triangles" },
        "status.generating" => if ru { "Генерация модели..." } else { "Generating model..." },
        "status.exported" => if ru { "Сохранено" } else { "Saved" },
        "status.frame" => if ru { "Кадр" } else { "Frame" },

        // ── Settings window ─────────────────────────────────
        "settings.title" => if ru { "Настройки" } else { "Settings" },
        "settings.service" => if ru { "Сервис генерации" } else { "Generation service" },
        "settings.service_url" => if ru { "Адрес" } else { "URL" },
        "settings.report_errors" => if ru { "Отправлять отчёты об ошибках" } else { "Send error reports" },
        "settings.viewer" => if ru { "Просмотр" } else { "Viewer" },
        "settings.background" => if ru { "Цвет фона" } else { "Background color" },
        "settings.model_color" => if ru { "Цвет модели" } else { "Model color" },
        "settings.grid" => if ru { "Показывать сетку" } else { "Show grid" },
        "settings.axes" => if ru { "Показывать оси" } else { "Show axes" },
        "settings.orbit_speed" => if ru { "Чувствительность вращения" } else { "Orbit sensitivity" },
        "settings.invert_wheel" => if ru { "Инвертировать колесо" } else { "Invert wheel" },
        "settings.max_operations" => if ru { "Лимит операций скрипта" } else { "Script operation limit" },
        "settings.ui" => if ru { "Интерфейс" } else { "Interface" },
        "settings.font_size" => if ru { "Размер шрифта" } else { "Font size" },
        "settings.brush_size" => if ru { "Толщина кисти" } else { "Brush size" },
        "settings.apply" => if ru { "Применить" } else { "Apply" },
        "settings.reset" => if ru { "Сбросить" } else { "Reset" },
        "settings.close" => if ru { "Закрыть" } else { "Close" },

        // ── Fallback ────────────────────────────────────────
        _ => "???",
    }
}
